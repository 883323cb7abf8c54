fn main() {
    if let Err(err) = vertex_lib::run() {
        eprintln!("vertex: {err:#}");
        std::process::exit(1);
    }
}
