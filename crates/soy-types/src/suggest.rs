//! "Did you mean" hints for unknown names.

/// The closest name to `wrong_name` within a small edit distance.
///
/// `names` must already be sorted; on ties the first candidate wins, which
/// keeps hints stable from run to run.
pub fn closest_name<'a>(names: &'a [String], wrong_name: &str) -> Option<&'a str> {
    // Same cutoff compilers like javac use: roughly a third of the name.
    let mut shortest = (wrong_name.len() + 2) / 3 + 1;
    let mut closest = None;
    for name in names {
        let distance = strsim::levenshtein(name, wrong_name);
        if distance < shortest {
            shortest = distance;
            closest = Some(name.as_str());
            if distance == 0 {
                break;
            }
        }
    }
    closest
}

/// A leading-space hint suitable for appending to a diagnostic, or an empty
/// string when nothing is close enough.
pub fn did_you_mean(names: &[String], wrong_name: &str) -> String {
    closest_name(names, wrong_name)
        .map(|name| format!(" Did you mean '{name}'?"))
        .unwrap_or_default()
}
