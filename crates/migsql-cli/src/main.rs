fn main() {
    dotenvy::dotenv().ok();
    if let Err(e) = migsql_cli::run(std::env::args().collect()) {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
