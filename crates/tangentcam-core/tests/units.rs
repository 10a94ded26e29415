use tangentcam_core::{DocumentUnit, Error, GcodeUnits, OutputUnits, Tolerance};

#[test]
fn test_every_document_unit_resolves() {
    let units = [
        DocumentUnit::In,
        DocumentUnit::Ft,
        DocumentUnit::Yd,
        DocumentUnit::Pc,
        DocumentUnit::Pt,
        DocumentUnit::Px,
        DocumentUnit::Mm,
        DocumentUnit::Cm,
        DocumentUnit::M,
        DocumentUnit::Km,
    ];
    for unit in units {
        let inferred = OutputUnits::Inferred.resolve(unit);
        let expected = if unit.is_imperial() {
            GcodeUnits::Inch
        } else {
            GcodeUnits::Millimeter
        };
        assert_eq!(inferred.units, expected, "{unit:?}");

        // Converting to mm and to inches must agree on the physical length.
        let mm = OutputUnits::Mm.resolve(unit).scale;
        let inch = OutputUnits::Inch.resolve(unit).scale;
        assert!((mm - inch * 25.4).abs() < 1e-9 * mm.max(1.0), "{unit:?}");
    }
}

#[test]
fn test_explicit_units_override_document() {
    let res = OutputUnits::Inch.resolve(DocumentUnit::Cm);
    assert_eq!(res.units, GcodeUnits::Inch);
    assert!((res.scale - 10.0 / 25.4).abs() < 1e-12);

    let res = OutputUnits::Mm.resolve(DocumentUnit::Pt);
    assert!((res.scale - 25.4 / 72.0).abs() < 1e-12);
}

#[test]
fn test_error_taxonomy() {
    let unreachable = Error::ToleranceUnreachable {
        tolerance: 0.01,
        deviation: 0.02,
        depth: 4,
    };
    assert!(unreachable.is_recoverable());
    assert!(Error::UnsupportedInput("spiral".into()).is_recoverable());

    let config = Error::invalid_config("tool.width", "must be a non-negative number");
    assert!(!config.is_recoverable());
    assert!(config.is_configuration_error());
    assert_eq!(
        config.to_string(),
        "Invalid configuration for 'tool.width': must be a non-negative number"
    );
}

#[test]
fn test_tolerance_drives_precision() {
    assert_eq!(Tolerance::default().precision(), 6);
    assert_eq!(Tolerance::uniform(1e-3).precision(), 3);
    assert!(Tolerance::uniform(0.5).eq(1.0, 1.4));
    assert!(!Tolerance::default().eq(1.0, 1.0001));
}
