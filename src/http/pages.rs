//! Server-rendered pages for the web interface.

use crate::repertoire::form::RepertoireForm;
use crate::repertoire::models::{FieldErrors, Kind, Rating, RepertoireItem};
use crate::utils::html::{escape, render_markdown};

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n{body}</body>\n</html>\n",
        title = escape(title),
        body = body,
    )
}

pub fn list_page(items: &[RepertoireItem]) -> String {
    let mut body = String::from("<p><a href=\"/new\">Add entry</a></p>\n");

    if items.is_empty() {
        body.push_str("<p>Nothing logged yet.</p>\n");
        return layout("Repertoire", &body);
    }

    body.push_str("<ul class=\"repertoire\">\n");
    for item in items {
        body.push_str(&item_entry(item));
    }
    body.push_str("</ul>\n");

    layout("Repertoire", &body)
}

fn item_entry(item: &RepertoireItem) -> String {
    let mut meta = vec![
        item.kind.label().to_string(),
        item.date.format("%d/%m/%Y").to_string(),
        item.rating.to_string(),
    ];
    if let Some(duration) = item.duration {
        meta.push(duration.to_string());
    }
    if let Some(season) = item.season {
        meta.push(format!("Season {}", season));
    }
    if item.is_from_current_year() {
        meta.push("This year".to_string());
    }

    let photo = item
        .photo_file_name()
        .map(|file| {
            format!(
                "<img src=\"/photos/{}\" alt=\"{}\" width=\"120\">\n",
                escape(file),
                escape(&item.name)
            )
        })
        .unwrap_or_default();

    format!(
        "<li id=\"item-{id}\">\n{photo}<h2>{name}</h2>\n<p>{meta}</p>\n{review}\
         <p><a href=\"/edit/{id}\">Edit</a> <a href=\"/delete/{id}\">Delete</a></p>\n</li>\n",
        id = item.id,
        photo = photo,
        name = escape(&item.name),
        meta = escape(&meta.join(" · ")),
        review = render_markdown(&item.review),
    )
}

/// Create or edit page; `photo` is the file currently attached, if any
pub fn form_page(
    title: &str,
    action: &str,
    form: &RepertoireForm,
    errors: &FieldErrors,
    photo: Option<&str>,
) -> String {
    let mut fields = String::new();

    fields.push_str(&input_row("name", "Name", "text", &form.name, errors));
    fields.push_str(&input_row("date", "Date", "date", &form.date, errors));
    fields.push_str(&rating_row(&form.rating, errors));
    fields.push_str(&review_row(&form.review, errors));
    fields.push_str(&kind_row(&form.kind, errors));
    fields.push_str(&input_row(
        "duration",
        "Duration (HH:MM)",
        "text",
        &form.duration,
        errors,
    ));
    fields.push_str(&input_row("season", "Season", "number", &form.season, errors));
    fields.push_str(&photo_row(photo, errors));

    let body = format!(
        "<form method=\"post\" action=\"{action}\" enctype=\"multipart/form-data\">\n\
         {fields}<p><button type=\"submit\">Save</button> <a href=\"/\">Cancel</a></p>\n</form>\n",
        action = escape(action),
        fields = fields,
    );

    layout(title, &body)
}

pub fn delete_page(item: &RepertoireItem) -> String {
    let body = format!(
        "<p>Delete \"{name}\"?</p>\n<form method=\"post\" action=\"/delete/{id}\">\n\
         <p><button type=\"submit\">Delete</button> <a href=\"/\">Cancel</a></p>\n</form>\n",
        name = escape(&item.name),
        id = item.id,
    );

    layout("Delete entry", &body)
}

fn field_errors(field: &str, errors: &FieldErrors) -> String {
    errors
        .get(field)
        .iter()
        .map(|message| format!("<span class=\"error\">{}</span>\n", escape(message)))
        .collect()
}

fn input_row(name: &str, label: &str, kind: &str, value: &str, errors: &FieldErrors) -> String {
    format!(
        "<p><label for=\"{name}\">{label}</label>\n\
         <input id=\"{name}\" name=\"{name}\" type=\"{kind}\" value=\"{value}\">\n{errors}</p>\n",
        name = name,
        label = escape(label),
        kind = kind,
        value = escape(value),
        errors = field_errors(name, errors),
    )
}

fn review_row(value: &str, errors: &FieldErrors) -> String {
    format!(
        "<p><label for=\"review\">Review</label>\n\
         <textarea id=\"review\" name=\"review\" rows=\"6\">{value}</textarea>\n{errors}</p>\n",
        value = escape(value),
        errors = field_errors("review", errors),
    )
}

fn rating_row(selected: &str, errors: &FieldErrors) -> String {
    let options: String = (Rating::MIN..=Rating::MAX)
        .filter_map(Rating::new)
        .map(|rating| {
            let value = rating.stars().to_string();
            option(&value, &rating.to_string(), selected.trim() == value)
        })
        .collect();

    select_row("rating", "Rating", &options, errors)
}

fn kind_row(selected: &str, errors: &FieldErrors) -> String {
    let selected = match selected.trim() {
        "" => Kind::default().code(),
        code => code,
    };
    let options: String = Kind::ALL
        .iter()
        .map(|kind| option(kind.code(), kind.label(), kind.code() == selected))
        .collect();

    select_row("kind", "Kind", &options, errors)
}

fn select_row(name: &str, label: &str, options: &str, errors: &FieldErrors) -> String {
    format!(
        "<p><label for=\"{name}\">{label}</label>\n\
         <select id=\"{name}\" name=\"{name}\">\n{options}</select>\n{errors}</p>\n",
        name = name,
        label = label,
        options = options,
        errors = field_errors(name, errors),
    )
}

fn option(value: &str, label: &str, selected: bool) -> String {
    format!(
        "<option value=\"{}\"{}>{}</option>\n",
        escape(value),
        if selected { " selected" } else { "" },
        escape(label)
    )
}

fn photo_row(current: Option<&str>, errors: &FieldErrors) -> String {
    let current = current
        .and_then(|name| name.rsplit('/').next())
        .map(|file| {
            format!(
                "Currently: <a href=\"/photos/{file}\">{file}</a>\n\
                 <input id=\"photo-clear\" name=\"photo-clear\" type=\"checkbox\">\
                 <label for=\"photo-clear\">Clear</label><br>\n",
                file = escape(file),
            )
        })
        .unwrap_or_default();

    format!(
        "<p><label for=\"photo\">Photo</label>\n{current}\
         <input id=\"photo\" name=\"photo\" type=\"file\" accept=\"image/*\">\n{errors}</p>\n",
        current = current,
        errors = field_errors("photo", errors),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn item() -> RepertoireItem {
        RepertoireItem {
            id: 7,
            name: "Tom & Jerry <Classic>".to_string(),
            date: NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
            rating: Rating::new(4).unwrap(),
            review: "Still *funny*.".to_string(),
            kind: Kind::Series,
            duration: "1:05".parse().ok(),
            season: Some(2),
            photo: Some("repertoire/photos/tom.png".to_string()),
        }
    }

    #[test]
    fn test_list_page_escapes_and_links() {
        let page = list_page(&[item()]);

        assert!(page.contains("Tom &amp; Jerry &lt;Classic&gt;"));
        assert!(page.contains("<em>funny</em>"));
        assert!(page.contains("1:05"));
        assert!(page.contains("Season 2"));
        assert!(page.contains("href=\"/edit/7\""));
        assert!(page.contains("href=\"/delete/7\""));
        assert!(page.contains("src=\"/photos/tom.png\""));
    }

    #[test]
    fn test_empty_list_page() {
        assert!(list_page(&[]).contains("Nothing logged yet."));
    }

    #[test]
    fn test_form_page_shows_errors_and_keeps_input() {
        let form = RepertoireForm {
            duration: "abc".to_string(),
            kind: "SERIES".to_string(),
            ..RepertoireForm::default()
        };
        let errors = FieldErrors::single("duration", "Invalid duration format 'abc'.");

        let page = form_page("New entry", "/new", &form, &errors, None);

        assert!(page.contains("value=\"abc\""));
        assert!(page.contains("Invalid duration format &#39;abc&#39;."));
        assert!(page.contains("<option value=\"SERIES\" selected>"));
        assert!(!page.contains("photo-clear"));
    }

    #[test]
    fn test_form_page_offers_photo_clear() {
        let page = form_page(
            "Edit entry",
            "/edit/7",
            &RepertoireForm::from_item(&item()),
            &FieldErrors::default(),
            Some("repertoire/photos/tom.png"),
        );

        assert!(page.contains("name=\"photo-clear\""));
        assert!(page.contains("<option value=\"4\" selected>"));
    }
}
