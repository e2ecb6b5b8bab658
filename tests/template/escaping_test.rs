//! Round-trip tests for template escaping.

use modelgraph::template::{
    escape_parameter_markers, escape_template_metacharacters, extract_placeholder_names,
    extract_property_names, extract_reference_names, scan, unescape_parameter_markers,
    unescape_template_metacharacters, Escaper, Fragment,
};

const SAMPLES: &[&str] = &[
    "",
    "plain text",
    "{",
    "}",
    "{}",
    "{{}}",
    "{name}",
    "{{name}}",
    "}{",
    "100%",
    "%s and %(name)s",
    "{%}",
    "naïve café ☕ {ü}",
    "'{\"json\": [1, 2]}'",
    "nested {{{{deep}}}} braces",
];

#[test]
fn test_round_trip_all_passes() {
    for passes in 1..=3 {
        for &s in SAMPLES {
            let escaped = escape_template_metacharacters(s, passes);
            assert_eq!(
                unescape_template_metacharacters(&escaped, passes),
                s,
                "passes={} input={:?}",
                passes,
                s
            );
        }
    }
}

/// Escaped text survives `passes` real substitution rounds unchanged.
#[test]
fn test_escaped_text_survives_substitution_rounds() {
    fn substitute_once(template: &str) -> String {
        scan(template)
            .unwrap()
            .into_iter()
            .map(|f| match f {
                Fragment::Literal(text) => text,
                Fragment::Field(name) => panic!("unexpected field {:?}", name),
            })
            .collect()
    }

    for passes in 1..=3 {
        for &s in SAMPLES {
            let mut text = escape_template_metacharacters(s, passes);
            for _ in 0..passes {
                text = substitute_once(&text);
            }
            assert_eq!(text, s, "passes={}", passes);
        }
    }
}

#[test]
fn test_percent_round_trip() {
    for &s in SAMPLES {
        assert_eq!(unescape_parameter_markers(&escape_parameter_markers(s)), s);
    }
}

#[test]
fn test_escaper_percent_applied_once() {
    let escaper = Escaper::new(2).with_percent(true);
    let escaped = escaper.escape("{50%}");
    assert_eq!(escaped, "{{{{50%%}}}}");
    assert_eq!(escaper.unescape(&escaped), "{50%}");
}

#[test]
fn test_placeholder_extraction() {
    let template = "select {cols} from {{orders}} o join {{customers}} c on {cond} -- {{{{literal}}}}";
    let names: Vec<String> = extract_placeholder_names(template).unwrap().into_iter().collect();
    assert_eq!(names, vec!["cols", "cond", "customers", "orders"]);

    let props: Vec<String> = extract_property_names(template).unwrap().into_iter().collect();
    assert_eq!(props, vec!["cols", "cond"]);

    let refs: Vec<String> = extract_reference_names(template).unwrap().into_iter().collect();
    assert_eq!(refs, vec!["customers", "orders"]);
}

#[test]
fn test_extraction_rejects_unbalanced_braces() {
    assert!(extract_placeholder_names("select {x").is_err());
    assert!(extract_placeholder_names("select x}").is_err());
    assert!(extract_placeholder_names("select {{{x}}}").is_err());
}
