//! Server-rendered HTML view of a form: labelled inputs, inline errors and the
//! formatted output of the last successful submit.

use super::binding::FormBinding;
use super::schema::FieldPath;

pub fn render_page(binding: &FormBinding, output: Option<&str>) -> String {
    let variant = binding.variant();
    let mut html = String::new();

    html.push_str("<!doctype html>\n<html lang=\"pt-BR\">\n<head><meta charset=\"utf-8\"><title>Cadastro</title></head>\n<body>\n<main>\n");
    html.push_str(&format!(
        "<form method=\"post\" data-variant=\"{}\">\n",
        variant.label()
    ));

    if variant.has_portfolio() {
        let selected = binding
            .avatar()
            .map(|file| format!(" <small>{}</small>", escape_html(&file.name)))
            .unwrap_or_default();
        html.push_str(&format!(
            "<div><label for=\"avatar\">Avatar</label><input type=\"file\" id=\"avatar\" name=\"avatar\" accept=\"image/*\">{selected}</div>\n"
        ));
        push_error(&mut html, binding, "avatar");
    }

    if variant.has_name() {
        push_input(&mut html, "name", "Nome", "text", binding.name());
        push_error(&mut html, binding, "name");
    }

    push_input(&mut html, "email", "E-mail", "email", binding.email());
    push_error(&mut html, binding, "email");

    // Password values are never echoed back into the page.
    push_input(&mut html, "password", "Senha", "password", None);
    push_error(&mut html, binding, "password");

    if variant.has_portfolio() {
        html.push_str("<fieldset id=\"techs\"><legend>Tecnologias</legend>\n");
        for (index, row) in binding.tech_rows().iter().enumerate() {
            let title = row.title.as_deref().map(escape_html).unwrap_or_default();
            let knowledge = row
                .knowledge
                .as_ref()
                .map(|value| match value {
                    serde_json::Value::String(raw) => escape_html(raw),
                    other => escape_html(&other.to_string()),
                })
                .unwrap_or_default();
            html.push_str(&format!(
                "<div data-tech-id=\"{id}\"><input type=\"text\" name=\"techs.{index}.title\" value=\"{title}\"><input type=\"number\" name=\"techs.{index}.knowledge\" value=\"{knowledge}\"></div>\n",
                id = row.id,
            ));
            push_error(&mut html, binding, FieldPath::tech(index, "title").as_str());
            push_error(&mut html, binding, FieldPath::tech(index, "knowledge").as_str());
        }
        html.push_str("<button type=\"button\" data-action=\"append-tech\">Adicionar</button>\n");
        push_error(&mut html, binding, "techs");
        html.push_str("</fieldset>\n");
    }

    html.push_str("<button type=\"submit\">Salvar</button>\n</form>\n");
    html.push_str(&format!(
        "<pre>{}</pre>\n",
        output.map(escape_html).unwrap_or_default()
    ));
    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn push_input(html: &mut String, id: &str, label: &str, kind: &str, value: Option<&str>) {
    let value = value.map(escape_html).unwrap_or_default();
    html.push_str(&format!(
        "<div><label for=\"{id}\">{label}</label><input type=\"{kind}\" id=\"{id}\" name=\"{id}\" value=\"{value}\"></div>\n"
    ));
}

fn push_error(html: &mut String, binding: &FormBinding, path: &str) {
    if let Some(message) = binding.error_for(path) {
        html.push_str(&format!(
            "<span class=\"error\" data-field=\"{}\">{}</span>\n",
            escape_html(path),
            escape_html(message)
        ));
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
