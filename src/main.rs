use ixa_infection::runner::run_with_args;

fn main() {
    if let Err(err) = run_with_args() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
