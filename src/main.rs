fn main() {
    if let Err(err) = plug_dashboard::app::run() {
        eprintln!("application startup failed: {err}");
        std::process::exit(1);
    }
}
