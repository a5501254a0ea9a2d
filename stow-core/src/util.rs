pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Writes `$1, $2, ... $n`.
pub fn write_placeholders(out: &mut String, count: usize) {
    separated_by(out, 1..=count, |out, i| out.push_str(&format!("${i}")), ", ");
}

/// Writes `a = $1, b = $2, ...`.
pub fn write_assignments<'a>(out: &mut String, columns: impl IntoIterator<Item = &'a String>) {
    let mut index = 0;
    separated_by(
        out,
        columns,
        |out, column| {
            index += 1;
            out.push_str(&format!("{column} = ${index}"));
        },
        ", ",
    );
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            &$query[..$crate::floor_char_boundary(&$query, 497)].trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}

#[doc(hidden)]
pub fn floor_char_boundary(value: &str, index: usize) -> usize {
    if index >= value.len() {
        return value.len();
    }
    (0..=index).rev().find(|i| value.is_char_boundary(*i)).unwrap_or(0)
}
