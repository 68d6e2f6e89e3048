use typebus_derive::bus_error;

#[bus_error]
pub enum DemoError {
    Io { source: std::io::Error },
}

fn main() {}
