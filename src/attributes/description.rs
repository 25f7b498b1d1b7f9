use scraper::{ElementRef, Html, Selector};

use super::value::{coerce_value, AttributeMap};

/// Extract `key -> value` attributes from the HTML table in a placemark description.
///
/// Accepted row shapes, looking only at the row's own cells:
/// - `<td>key</td><td>value</td>`
/// - `<th>key</th><td>value</td>`
///
/// Any other row is skipped, as are rows with an empty key. The HTML parser is
/// lenient, so broken markup yields whatever rows survive rather than an error.
pub fn parse_description_table(description: Option<&str>) -> AttributeMap {
    let mut attributes = AttributeMap::new();
    let description = match description {
        Some(description) if !description.trim().is_empty() => description,
        _ => return attributes,
    };

    // The HTML tree builder drops <tr> and <td> tags outside a table.
    let html = if description.to_ascii_lowercase().contains("<table") {
        Html::parse_fragment(description)
    } else {
        Html::parse_fragment(&format!("<table>{}</table>", description))
    };
    if !html.errors.is_empty() {
        log::debug!(
            "Recovered from {} HTML errors in description",
            html.errors.len()
        );
    }

    let row_selector = match Selector::parse("tr") {
        Ok(selector) => selector,
        Err(_) => return attributes,
    };
    for row in html.select(&row_selector) {
        match key_value_from_row(row) {
            Some((key, value)) => attributes.insert(key, coerce_value(&value)),
            None => log::debug!("Skipping table row without a key/value pair"),
        }
    }
    attributes
}

fn key_value_from_row(row: ElementRef) -> Option<(String, String)> {
    let cells: Vec<ElementRef> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
        .collect();
    let (key, value) = match cells.as_slice() {
        [key, value] if value.value().name() == "td" => (cell_text(key), cell_text(value)),
        _ => return None,
    };
    if key.is_empty() {
        return None;
    }
    Some((key, value))
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}
