use std::fmt;

pub fn display_fn(f: impl Fn(&mut fmt::Formatter<'_>) -> fmt::Result) -> impl fmt::Display {
    DisplayFn(f)
}

struct DisplayFn<F>(F);
impl<F> fmt::Display for DisplayFn<F>
where
    F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.0)(formatter)
    }
}

/// Render a collection of symbol names in set notation, e.g. `{A, B}` or `∅`.
pub fn set_notation<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = String::new();
    for (i, name) in names.into_iter().enumerate() {
        out.push_str(if i == 0 { "{" } else { ", " });
        out.push_str(name);
    }
    if out.is_empty() {
        out.push('∅');
    } else {
        out.push('}');
    }
    out
}
