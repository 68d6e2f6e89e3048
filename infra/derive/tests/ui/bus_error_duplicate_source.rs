use typebus_derive::bus_error;

#[bus_error]
pub enum DemoError {
    Read { source: std::io::Error, context: Option<std::borrow::Cow<'static, str>> },
    Write { source: std::io::Error, context: Option<std::borrow::Cow<'static, str>> },
}

fn main() {}
