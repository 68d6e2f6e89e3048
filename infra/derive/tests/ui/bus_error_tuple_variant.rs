use typebus_derive::bus_error;

#[bus_error]
pub enum DemoError {
    Io(std::io::Error),
}

fn main() {}
