use padnav::{Gamepad, InputConfig, PollDriver};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() {
    FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .init();

    // Usage: poll [config.toml|config.json] [ticks]
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => InputConfig::load(&path).expect("load config"),
        None => InputConfig::default(),
    };
    let limit: Option<u64> = args.next().and_then(|s| s.parse().ok());

    let mut driver = PollDriver::from_config(Gamepad::native(&config), &config);
    let stop = AtomicBool::new(false);
    let mut ticks = 0u64;
    let mut last_status = String::new();

    driver.run(&stop, |result| {
        ticks += 1;
        let status = result.status();
        if status != last_status {
            println!("{status}");
            last_status = status;
        }
        if !result.frame.is_empty() {
            println!("  {}", result.frame.pressed().join("+"));
        }
        if limit.is_some_and(|n| ticks >= n) {
            stop.store(true, Ordering::Release);
        }
    });
}
