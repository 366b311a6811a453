//! Server-rendered HTML views.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::config::{AGE_LABEL, COURSE_LABEL, PAGE_TITLE};
use crate::domain::Record;

/// Render the record list page.
///
/// One block per record, in the given order, keyed by the record id.
pub fn render_record_list(records: &[Record]) -> String {
    let mut blocks = String::new();
    for record in records {
        blocks.push_str(&render_record(record));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<main>
{blocks}</main>
</body>
</html>
"#,
        title = encode_text(PAGE_TITLE),
    )
}

fn render_record(record: &Record) -> String {
    let key = record.id.to_string();
    format!(
        r#"<div class="record" data-key="{key}">
<h2>{name}</h2>
<p>{age_label}: {age}</p>
<p>{course_label}: {course}</p>
</div>
"#,
        key = encode_double_quoted_attribute(&key),
        name = encode_text(&record.name),
        age_label = AGE_LABEL,
        age = record.age,
        course_label = COURSE_LABEL,
        course = encode_text(&record.course),
    )
}
