const DECORATIONS: &[&str] = &[
    "-\n", "–\n", "—\n", "- \n", "-", "–", "—", "•", "·", "●", "○", "▪", "▫", "□", "■", "\t",
];

/// Canonical lower-case form of extracted plan text used for all marker search.
///
/// Deleting decorations can leave fresh double spaces or short lines behind,
/// so the cleanup pass repeats until it no longer changes the text.
pub fn normalize_text(raw: &str) -> String {
    let mut current = normalize_pass(raw);
    loop {
        let next = normalize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_pass(raw: &str) -> String {
    let text = raw.replace('\u{a0}', " ");
    let text = collapse_runs(&text, ' ');
    let text = keep_lines(&text, |line| !line.trim().is_empty());
    let text = collapse_runs(&text, '\n');
    let text = keep_lines(&text, |line| line.trim().chars().count() > 2);
    let mut text = text.replace(" \n", "\n").replace("\n ", "\n");

    for decoration in DECORATIONS {
        text = text.replace(decoration, "");
    }

    text.to_lowercase()
}

fn collapse_runs(input: &str, target: char) -> String {
    let mut out = String::with_capacity(input.len());
    let mut previous = None;
    for ch in input.chars() {
        if ch == target && previous == Some(target) {
            continue;
        }
        out.push(ch);
        previous = Some(ch);
    }
    out
}

fn keep_lines(input: &str, keep: impl Fn(&str) -> bool) -> String {
    input
        .split('\n')
        .filter(|line| keep(line))
        .collect::<Vec<&str>>()
        .join("\n")
}
