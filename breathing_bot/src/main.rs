use bot_commons::*;

fn main() {
    start_everything("WARN,breathing_bot=debug", breathing_bot::entry());
}
