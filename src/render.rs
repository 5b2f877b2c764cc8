//! Rendering needs as cards.
//!
//! Every renderer produces the complete output for the sequence it is given.
//! An empty sequence renders a single "no results" placeholder.

use std::io::{self, Write};

use crate::domain::Need;

/// Placeholder shown when there is nothing to list.
pub const NO_RESULTS: &str = "No needs registered yet.";

/// A CSS-class-safe token for an aid type.
///
/// The aid type is lowercased and every whitespace character becomes `-`.
///
/// ```
/// assert_eq!(needboard::render::tag_class("Personal Hygiene"), "personal-hygiene");
/// ```
#[must_use]
pub fn tag_class(aid_type: &str) -> String {
    aid_type
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect()
}

/// The fields shown on a need card.
#[derive(Debug, Clone)]
pub struct Card<'a> {
    /// Title of the need.
    pub title: &'a str,
    /// Institution asking for help.
    pub institution: &'a str,
    /// Aid type, as shown on the tag.
    pub aid_type: &'a str,
    /// CSS class of the tag.
    pub tag_class: String,
    /// Description of the need.
    pub description: &'a str,
    /// `city - state`.
    pub location: String,
    /// E-mail or phone.
    pub contact: &'a str,
}

impl<'a> From<&'a Need> for Card<'a> {
    fn from(need: &'a Need) -> Self {
        let address = need.address();
        Self {
            title: need.title(),
            institution: need.institution(),
            aid_type: need.aid_type(),
            tag_class: tag_class(need.aid_type()),
            description: need.description(),
            location: format!("{} - {}", address.city, address.state),
            contact: need.contact(),
        }
    }
}

/// Write needs as plain text cards, wrapping the description to `width`
/// columns.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_cards<W: Write>(out: &mut W, needs: &[&Need], width: usize) -> io::Result<()> {
    if needs.is_empty() {
        return writeln!(out, "{NO_RESULTS}");
    }

    for (i, need) in needs.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        let card = Card::from(*need);
        writeln!(out, "{}  [{}]", card.title, card.aid_type)?;
        writeln!(out, "{}", card.institution)?;
        for line in wrap(card.description, width) {
            writeln!(out, "  {line}")?;
        }
        writeln!(out, "{}", card.location)?;
        writeln!(out, "Contact: {}", card.contact)?;
    }
    Ok(())
}

/// Write needs as a JSON array of the stored records.
///
/// An empty sequence is written as `[]`.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_json<W: Write>(out: &mut W, needs: &[&Need]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, needs)?;
    writeln!(out)
}

/// Write needs as `need-card` HTML markup.
///
/// All text is escaped.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_html<W: Write>(out: &mut W, needs: &[&Need]) -> io::Result<()> {
    if needs.is_empty() {
        return writeln!(out, "<p class=\"no-results\">{}</p>", escape(NO_RESULTS));
    }

    for need in needs {
        let card = Card::from(*need);
        writeln!(out, "<div class=\"need-card\">")?;
        writeln!(out, "  <h3>{}</h3>", escape(card.title))?;
        writeln!(out, "  <p class=\"institution\">{}</p>", escape(card.institution))?;
        writeln!(
            out,
            "  <span class=\"tag {}\">{}</span>",
            escape(&card.tag_class),
            escape(card.aid_type)
        )?;
        writeln!(out, "  <p class=\"description\">{}</p>", escape(card.description))?;
        writeln!(out, "  <div class=\"need-footer\">")?;
        writeln!(out, "    <p class=\"location\">{}</p>", escape(&card.location))?;
        writeln!(out, "    <p class=\"contact\">Contact: {}</p>", escape(card.contact))?;
        writeln!(out, "  </div>")?;
        writeln!(out, "</div>")?;
    }
    Ok(())
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if line.is_empty() {
                word.chars().count()
            } else {
                line.chars().count() + 1 + word.chars().count()
            };
            if needed > width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::form::tests::complete_form;

    fn need(aid_type: &str, title: &str) -> Need {
        let mut form = complete_form();
        form.aid_type = aid_type.to_string();
        form.title = title.to_string();
        Need::from_form(&form, String::new()).unwrap()
    }

    fn render(f: impl Fn(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn tag_class_replaces_each_whitespace_character() {
        assert_eq!(tag_class("Food"), "food");
        assert_eq!(tag_class("Personal  Hygiene"), "personal--hygiene");
        assert_eq!(tag_class("Material\tEscolar"), "material-escolar");
    }

    #[test]
    fn empty_sequence_renders_placeholder() {
        assert_eq!(render(|out| write_cards(out, &[], 80)), format!("{NO_RESULTS}\n"));
        assert_eq!(
            render(|out| write_html(out, &[])),
            format!("<p class=\"no-results\">{NO_RESULTS}</p>\n")
        );
        assert_eq!(render(|out| write_json(out, &[])), "[]\n");
    }

    #[test]
    fn cards_show_every_field() {
        let a = need("Food", "Winter coats");
        let text = render(|out| write_cards(out, &[&a], 80));

        assert!(text.starts_with("Winter coats  [Food]\nCasa de Apoio\n"));
        assert!(text.contains("  Coats for forty children\n"));
        assert!(text.contains("São Paulo - SP\n"));
        assert!(text.ends_with("Contact: contato@casa.org\n"));
    }

    #[test]
    fn one_card_per_need_in_order() {
        let a = need("Food", "Winter coats");
        let b = need("Clothing", "Blankets");
        let html = render(|out| write_html(out, &[&a, &b]));

        assert_eq!(html.matches("<div class=\"need-card\">").count(), 2);
        let first = html.find("Winter coats").unwrap();
        let second = html.find("Blankets").unwrap();
        assert!(first < second);
        assert!(html.contains("<span class=\"tag clothing\">Clothing</span>"));
    }

    #[test]
    fn html_is_escaped() {
        let a = need("Food", "<script>alert('x')</script>");
        let html = render(|out| write_html(out, &[&a]));

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }

    #[test]
    fn json_lists_stored_records() {
        let a = need("Food", "Winter coats");
        let json = render(|out| write_json(out, &[&a]));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["title"], "Winter coats");
        assert_eq!(value[0]["address"]["city"], "São Paulo");
    }

    #[test]
    fn wrap_respects_width() {
        assert_eq!(wrap("one two three", 7), ["one two", "three"]);
        assert_eq!(wrap("unbreakable", 4), ["unbreakable"]);
        assert_eq!(wrap("a\nb", 80), ["a", "b"]);
    }

    #[test]
    fn rendering_is_repeatable() {
        let a = need("Food", "Winter coats");
        let first = render(|out| write_cards(out, &[&a], 40));
        let second = render(|out| write_cards(out, &[&a], 40));
        assert_eq!(first, second);
    }
}
