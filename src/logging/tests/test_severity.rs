use crate::logging::{LogError, Severity};

#[test]
fn test_severity_ranks() {
    assert_eq!(Severity::Debug.rank(), 10);
    assert_eq!(Severity::Info.rank(), 20);
    assert_eq!(Severity::Warning.rank(), 30);
    assert_eq!(Severity::Error.rank(), 40);
    assert_eq!(Severity::Critical.rank(), 50);
}

#[test]
fn test_severity_ordering_is_monotonic() {
    for pair in Severity::ALL.windows(2) {
        assert!(pair[0] < pair[1]);
        assert!(pair[0].rank() < pair[1].rank());
    }
}

#[test]
fn test_severity_from_rank() {
    assert_eq!(Severity::from_rank(30), Ok(Severity::Warning));
    assert_eq!(Severity::try_from(50), Ok(Severity::Critical));
    assert!(Severity::is_valid_rank(10));
    assert!(!Severity::is_valid_rank(0));
    assert_eq!(
        Severity::from_rank(25),
        Err(LogError::InvalidLevel("25".to_string()))
    );
}

#[test]
fn test_severity_from_str() {
    assert_eq!("info".parse::<Severity>(), Ok(Severity::Info));
    assert_eq!("WARN".parse::<Severity>(), Ok(Severity::Warning));
    assert_eq!(" Critical ".parse::<Severity>(), Ok(Severity::Critical));
    assert!(matches!(
        "verbose".parse::<Severity>(),
        Err(LogError::InvalidLevel(_))
    ));
}

#[test]
fn test_severity_display_and_default() {
    assert_eq!(Severity::Warning.to_string(), "WARNING");
    assert_eq!(Severity::default(), Severity::Debug);
}

#[test]
fn test_severity_from_log_level() {
    assert_eq!(Severity::from(log::Level::Trace), Severity::Debug);
    assert_eq!(Severity::from(log::Level::Debug), Severity::Debug);
    assert_eq!(Severity::from(log::Level::Warn), Severity::Warning);
    assert_eq!(Severity::from(log::Level::Error), Severity::Error);
}
