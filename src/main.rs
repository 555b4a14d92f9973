fn main() {
    std::process::exit(daiv_plugin::app::startup::startup());
}
