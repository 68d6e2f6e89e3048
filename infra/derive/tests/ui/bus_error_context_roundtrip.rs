use std::borrow::Cow;
use typebus_derive::bus_error;

#[bus_error]
pub enum ReadError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Rejected at {offset}{}: {message}", format_context(.context))]
    Rejected { offset: usize, message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Truncated")]
    Truncated {},
}

fn read_missing() -> Result<Vec<u8>, ReadError> {
    std::fs::read("/definitely/not/here").context("Reading snapshot")
}

fn reject() -> Result<(), ReadError> {
    Err(ReadError::Rejected { offset: 7, message: "bad magic".into(), context: None })
}

fn main() {
    let err = read_missing().unwrap_err();
    assert!(err.to_string().starts_with("IO error (Reading snapshot): "));

    let err = reject().context("header").unwrap_err();
    assert_eq!(err.to_string(), "Rejected at 7 (header): bad magic");

    let converted: ReadError = std::io::Error::other("boom").into();
    assert_eq!(converted.to_string(), "IO error: boom");

    let truncated: Result<(), ReadError> = Err(ReadError::Truncated {});
    assert_eq!(truncated.context("ignored").unwrap_err().to_string(), "Truncated");
}
