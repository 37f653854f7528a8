use super::*;

const TPX: &str = "{http://www.garmin.com/xmlschemas/TrackPointExtension/v1}";
const PWR: &str = "{http://www.garmin.com/xmlschemas/PowerExtension/v1}PowerInWatts";

fn located(ele: Option<f64>) -> TrackPoint {
    TrackPoint {
        lat: Some(45.0),
        lon: Some(7.0),
        elevation: ele,
        ..TrackPoint::default()
    }
}

#[test]
fn position_and_elevation_without_sensors() {
    let points = vec![located(Some(10.0)); 5];
    let d = discover(&points);
    assert_eq!(
        d.capabilities.iter().collect::<Vec<_>>(),
        vec![
            AttributeKind::Course,
            AttributeKind::Elevation,
            AttributeKind::Gradient,
            AttributeKind::Speed
        ]
    );
    assert!(d.channels.is_empty());
}

#[test]
fn gradient_requires_elevation() {
    let d = discover(&[located(None), located(None)]);
    assert!(d.capabilities.contains(AttributeKind::Course));
    assert!(!d.capabilities.contains(AttributeKind::Gradient));
}

#[test]
fn sensors_found_at_both_depths_record_paths() {
    let mut p = located(Some(1.0));
    p.extensions = vec![
        Extension::leaf(PWR, "200"),
        Extension::node(
            format!("{TPX}TrackPointExtension"),
            vec![
                Extension::leaf(format!("{TPX}hr"), "140"),
                Extension::leaf(format!("{TPX}cad"), "90"),
            ],
        ),
    ];
    let points = vec![located(Some(1.0)), p, located(Some(1.0))];
    let d = discover(&points);

    assert!(d.capabilities.contains(AttributeKind::Power));
    assert!(d.capabilities.contains(AttributeKind::Heartrate));
    assert!(d.capabilities.contains(AttributeKind::Cadence));
    assert!(!d.capabilities.contains(AttributeKind::Temperature));

    assert_eq!(d.channels[&AttributeKind::Power].0, vec![(0, PWR.to_owned())]);
    let cad = &d.channels[&AttributeKind::Cadence].0;
    assert_eq!(cad.len(), 2);
    assert_eq!(cad[1], (1, format!("{TPX}cad")));
}

#[test]
fn only_probe_points_are_inspected() {
    // Sensor present only at index 1 of 5: probes are 0, 2 and 4.
    let mut points = vec![located(Some(1.0)); 5];
    points[1].extensions = vec![Extension::leaf("power", "100")];
    assert!(!discover(&points).capabilities.contains(AttributeKind::Power));
}

#[test]
fn empty_input_has_no_capabilities() {
    assert!(discover(&[]).capabilities.is_empty());
}
