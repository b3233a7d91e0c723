use std::sync::LazyLock;

use regex::Regex;

/// Printer's imprint stamped on National Assembly Press output. Words may be
/// split by any whitespace, including line breaks; the comma before ABUJA is
/// optional and one trailing punctuation mark goes with it.
static IMPRINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)(?:^[ \t]*)?\bPRINTED\s+BY\s+NATIONAL\s+ASSEMBLY\s+PRESS(?:\s*,\s*|\s+)ABUJA\b[.,;:]?[ \t]*",
    )
    .expect("imprint pattern is valid")
});

/// Removes every imprint occurrence, returning the cleaned text and how many
/// were removed.
pub fn strip_boilerplate(text: &str) -> (String, usize) {
    if text.is_empty() {
        return (String::new(), 0);
    }

    let mut current = text.to_string();
    let mut removed = 0;
    // Removal can join fragments into a new match, so repeat until stable.
    loop {
        let found = IMPRINT.find_iter(&current).count();
        if found == 0 {
            return (current, removed);
        }
        removed += found;
        current = IMPRINT.replace_all(&current, "").into_owned();
    }
}

pub fn clean_text(text: &str) -> String {
    strip_boilerplate(text).0
}
