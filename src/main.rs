fn main() {
    if let Err(err) = bubble_swarm::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
