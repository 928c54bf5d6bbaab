fn main() {
    if let Err(err) = plug_dashboard::app::run_cli() {
        eprintln!("plug_cli failed: {err}");
        std::process::exit(1);
    }
}
