use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

/// In-memory roster: student ID -> display name, plus the photo label
/// mapping. Loaded once from the data directory, read-only afterwards.
pub struct Roster {
    students: HashMap<String, String>,
    // (label, student id) pairs kept in deterministic label order.
    // Labels are not unique per student; lookup takes the first match.
    photos: Vec<(String, String)>,
    photo_mapping_loaded: bool,
}

// Scan order for "first matching label": integer-like labels ascend
// numerically ahead of the rest, the way JS object iteration orders the
// original mapping's keys ("3" before "17").
fn label_order(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

impl Roster {
    /// Loads `students.json` (required) and `photo-mapping.json` (optional)
    /// from `dir`. A missing photo mapping degrades every student to
    /// "no photo" instead of failing the load.
    pub fn load(dir: &Path) -> anyhow::Result<Roster> {
        let students_path = dir.join("students.json");
        let raw = std::fs::read_to_string(&students_path)
            .with_context(|| format!("read {}", students_path.display()))?;
        let students: HashMap<String, String> = serde_json::from_str(&raw)
            .with_context(|| format!("parse {}", students_path.display()))?;

        let mapping_path = dir.join("photo-mapping.json");
        let (photos, photo_mapping_loaded) = match std::fs::read_to_string(&mapping_path) {
            Ok(raw) => {
                let value: serde_json::Value = serde_json::from_str(&raw)
                    .with_context(|| format!("parse {}", mapping_path.display()))?;
                let obj = value
                    .as_object()
                    .context("photo-mapping.json must be an object")?;
                let mut photos: Vec<(String, String)> = obj
                    .iter()
                    .filter_map(|(label, v)| {
                        v.as_str().map(|id| (label.clone(), id.to_string()))
                    })
                    .collect();
                photos.sort_by(|(a, _), (b, _)| label_order(a, b));
                (photos, true)
            }
            Err(_) => (Vec::new(), false),
        };

        Ok(Roster {
            students,
            photos,
            photo_mapping_loaded,
        })
    }

    #[cfg(test)]
    pub fn from_parts(students: HashMap<String, String>, photos: Vec<(String, String)>) -> Roster {
        Roster {
            students,
            photos,
            photo_mapping_loaded: true,
        }
    }

    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    pub fn photo_label_count(&self) -> usize {
        self.photos.len()
    }

    pub fn photo_mapping_loaded(&self) -> bool {
        self.photo_mapping_loaded
    }

    pub fn contains(&self, id: &str) -> bool {
        self.students.contains_key(id)
    }

    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.students.get(id).map(|s| s.as_str())
    }

    /// First photo label mapped to this student, if any.
    pub fn photo_label(&self, id: &str) -> Option<&str> {
        self.photos
            .iter()
            .find(|(_, sid)| sid == id)
            .map(|(label, _)| label.as_str())
    }

    /// Splits a normalized ID sequence into roster members and unknowns,
    /// both in first-occurrence order.
    pub fn partition_known<'a>(&self, ids: &'a [String]) -> (Vec<&'a str>, Vec<&'a str>) {
        let mut known = Vec::new();
        let mut unknown = Vec::new();
        for id in ids {
            if self.contains(id) {
                known.push(id.as_str());
            } else {
                unknown.push(id.as_str());
            }
        }
        (known, unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> std::path::PathBuf {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    #[test]
    fn load_with_photo_mapping() {
        let dir = temp_dir("rollcall-roster");
        std::fs::write(
            dir.join("students.json"),
            r#"{"123456789":"Alice Chen","987654321":"Bo Zhang"}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("photo-mapping.json"),
            r#"{"7":"123456789","12":"987654321"}"#,
        )
        .unwrap();

        let roster = Roster::load(&dir).expect("load roster");
        assert_eq!(roster.student_count(), 2);
        assert_eq!(roster.photo_label_count(), 2);
        assert!(roster.photo_mapping_loaded());
        assert_eq!(roster.name_of("123456789"), Some("Alice Chen"));
        assert_eq!(roster.photo_label("123456789"), Some("7"));
        assert_eq!(roster.photo_label("987654321"), Some("12"));
    }

    #[test]
    fn missing_photo_mapping_is_tolerated() {
        let dir = temp_dir("rollcall-roster-nophotos");
        std::fs::write(dir.join("students.json"), r#"{"123456789":"Alice"}"#).unwrap();

        let roster = Roster::load(&dir).expect("load roster");
        assert!(!roster.photo_mapping_loaded());
        assert_eq!(roster.photo_label("123456789"), None);
    }

    #[test]
    fn missing_students_file_fails() {
        let dir = temp_dir("rollcall-roster-empty");
        assert!(Roster::load(&dir).is_err());
    }

    #[test]
    fn photo_scan_orders_labels_numerically() {
        let dir = temp_dir("rollcall-roster-order");
        std::fs::write(
            dir.join("students.json"),
            r#"{"123456789":"Alice","987654321":"Bo"}"#,
        )
        .unwrap();
        // Lexicographic order would put "17" ahead of "3".
        std::fs::write(
            dir.join("photo-mapping.json"),
            r#"{"17":"123456789","3":"123456789","alpha":"987654321","9":"987654321"}"#,
        )
        .unwrap();

        let roster = Roster::load(&dir).expect("load roster");
        assert_eq!(roster.photo_label("123456789"), Some("3"));
        // Non-numeric labels scan after every numeric one.
        assert_eq!(roster.photo_label("987654321"), Some("9"));
    }

    #[test]
    fn photo_label_takes_first_match() {
        let students = HashMap::from([("123456789".to_string(), "Alice".to_string())]);
        let photos = vec![
            ("03".to_string(), "123456789".to_string()),
            ("10".to_string(), "123456789".to_string()),
        ];
        let roster = Roster::from_parts(students, photos);
        assert_eq!(roster.photo_label("123456789"), Some("03"));
    }

    #[test]
    fn partition_preserves_order() {
        let students = HashMap::from([("123456789".to_string(), "Alice".to_string())]);
        let roster = Roster::from_parts(students, Vec::new());
        let ids = vec![
            "123456789".to_string(),
            "000000000".to_string(),
            "123456789".to_string(),
        ];
        let (known, unknown) = roster.partition_known(&ids);
        assert_eq!(known, vec!["123456789", "123456789"]);
        assert_eq!(unknown, vec!["000000000"]);
    }
}
