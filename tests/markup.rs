//! Markup stripping integration tests.

use subcue::{BoundedWriter, MarkupStripper, markup};

// ── Tags and escapes ───────────────────────────────────────────────

#[test]
fn plain_text_passes_through() {
    assert_eq!(markup::strip("Hello, world!"), "Hello, world!");
    assert_eq!(markup::strip(""), "");
}

#[test]
fn override_blocks_are_removed() {
    assert_eq!(markup::strip(r"{\b1}Bold{\b0} and {\i1}italic{\i0}"), "Bold and italic");
    assert_eq!(markup::strip(r"{\an8\pos(320,50)}Top"), "Top");
}

#[test]
fn escapes_become_line_breaks_and_spaces() {
    assert_eq!(markup::strip(r"a\Nb\hc"), "a\nb c");
    assert_eq!(markup::strip(r"soft\nbreak"), "soft\nbreak");
}

#[test]
fn other_backslashes_are_kept() {
    assert_eq!(markup::strip(r"C:\path\to"), r"C:\path\to");
}

#[test]
fn escapes_inside_tags_are_ignored() {
    assert_eq!(markup::strip(r"a{\N}b"), "ab");
}

#[test]
fn unterminated_tag_is_emitted_verbatim() {
    assert_eq!(markup::strip("a{bold"), "a{bold");
    assert_eq!(markup::strip(r"x{\b1}y{\i1"), r"xy{\i1");
}

#[test]
fn stray_closing_brace_is_text() {
    assert_eq!(markup::strip("a}b"), "a}b");
}

#[test]
fn multibyte_text_survives() {
    assert_eq!(markup::strip(r"{\i1}日本語{\i0}\Nçà"), "日本語\nçà");
}

// ── Drawing mode ───────────────────────────────────────────────────

#[test]
fn drawing_mode_hides_text() {
    assert_eq!(markup::strip(r"x{\p1}hidden{\p0}y"), "xy");
}

#[test]
fn drawing_mode_without_digits_turns_off() {
    assert_eq!(markup::strip(r"{\p2}m 0 0{\p}shown"), "shown");
}

#[test]
fn line_breaks_are_emitted_in_drawing_mode() {
    assert_eq!(markup::strip(r"{\p1}a\Nb{\p0}c"), "\nc");
}

#[test]
fn drawing_mode_persists_to_end_of_input() {
    assert_eq!(markup::strip(r"visible{\p1}m 0 0 l 10 10"), "visible");
}

// ── Idempotence ────────────────────────────────────────────────────

#[test]
fn stripping_plain_output_again_is_a_no_op() {
    let inputs = [
        r"{\b1}Hello{\b0} there",
        r"x{\p1}hidden{\p0}y",
        "unterminated {tag",
        "nothing to strip",
    ];

    for input in inputs {
        let once = markup::strip(input);
        if !once.contains('{') && !once.contains('\\') {
            assert_eq!(markup::strip(&once), once, "input: {input:?}");
        }
    }
}

// ── Capacity ───────────────────────────────────────────────────────

#[test]
fn output_never_exceeds_capacity() {
    let input = r"{\b1}".to_string() + &"abcdefghij".repeat(20);
    for capacity in [0, 1, 7, 64, 199, 200, 511] {
        let output = MarkupStripper::new(capacity).strip(&input);
        assert!(output.len() <= capacity, "capacity {capacity}: {}", output.len());
    }
}

#[test]
fn truncated_output_is_a_prefix() {
    let input = r"{\i1}The quick brown fox{\i0}\Njumps over the lazy dog";
    let full = markup::strip(input);
    let truncated = MarkupStripper::new(12).strip(input);
    assert_eq!(truncated, "The quick br");
    assert!(full.starts_with(&truncated));
}

#[test]
fn truncation_never_splits_a_character() {
    let output = MarkupStripper::new(4).strip("ab日本");
    assert_eq!(output, "ab");
}

#[test]
fn default_capacity_is_511_bytes() {
    assert_eq!(MarkupStripper::default().capacity(), markup::DEFAULT_CAPACITY);
    assert_eq!(markup::DEFAULT_CAPACITY, 511);
    assert_eq!(markup::strip(&"x".repeat(600)).len(), 511);
}

#[test]
fn huge_capacity_is_not_preallocated() {
    assert_eq!(MarkupStripper::new(usize::MAX).strip(r"{\b1}hi"), "hi");

    let mut writer = BoundedWriter::new(usize::MAX);
    assert!(writer.push_str("still fine"));
    assert_eq!(writer.capacity(), usize::MAX);
}

#[test]
fn strip_into_appends_to_writer() {
    let mut writer = BoundedWriter::new(32);
    writer.push_str("> ");
    MarkupStripper::default().strip_into(r"{\b1}hi", &mut writer);
    assert_eq!(writer.as_str(), "> hi");
    assert!(!writer.is_truncated());
}
