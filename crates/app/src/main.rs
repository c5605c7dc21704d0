use gesture_watch::gesture::{self, GestureConfig};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = GestureConfig::from_args(&args)?;
    gesture::run(config)
}
