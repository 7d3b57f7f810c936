fn main() {
    if let Err(err) = data_profiler::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
