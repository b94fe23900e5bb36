fn main() -> anyhow::Result<()> {
    ham_counter_lib::run()
}
