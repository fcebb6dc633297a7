fn main() {
    if let Err(err) = ev_sales_etl::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
