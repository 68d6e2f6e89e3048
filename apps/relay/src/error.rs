use std::borrow::Cow;

#[typebus_derive::bus_error]
pub enum RelayError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },

    #[error("Logger error{}: {source}", format_context(.context))]
    Logger { source: typebus_logger::LoggerError, context: Option<Cow<'static, str>> },

    #[error("Bus error{}: {source}", format_context(.context))]
    Bus { source: typebus::BusError, context: Option<Cow<'static, str>> },
}
