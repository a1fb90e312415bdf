// src/services/extraction.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::source_import::RowFields;

// ---
// Tabelas de aliases (campo alvo -> nomes de coluna aceitos, em ordem)
// ---
pub const TENANT_ALIASES: &[&str] = &["商戶", "租戶名稱", "客戶名稱", "公司名稱", "樓層/公司名稱"];
pub const FLOOR_ALIASES: &[&str] = &["樓層", "樓層/公司名稱"];
pub const UNIT_ALIASES: &[&str] = &["戶號", "戶別", "室號"];
pub const CONTACT_NAME_ALIASES: &[&str] = &["主要聯絡人", "聯絡人", "第一聯絡人"];
pub const PHONE_ALIASES: &[&str] = &["公司電話", "電話", "手機"];
pub const EMAIL_ALIASES: &[&str] = &["信件", "信箱", "mail", "email"];

const KEY_PUNCTUATION: &[char] = &['：', ':', '／', '/', '(', ')', '（', '）', '-', '_', '.', '，', ',', '、'];
const UNIT_SEPARATORS: &[char] = &['、', ',', '，', '/', '&', '~', '～'];

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("regex válida"));
static BASEMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"B\s*([0-9]{1,2})").expect("regex válida"));
static ABOVE_GROUND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]{1,3})\s*F").expect("regex válida"));
static PLAIN_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]{1,3})$").expect("regex válida"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}").expect("regex válida"));
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[+0-9][0-9\-#()\s]{5,}").expect("regex válida"));

/// O que conseguimos tirar de uma linha qualquer. Não é persistido.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredCandidate {
    pub tenant_name: Option<String>,
    pub floor_label: Option<String>,
    pub unit_code: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
}

fn normalize_key(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && !KEY_PUNCTUATION.contains(c))
        .collect()
}

/// Primeiro valor não vazio cuja coluna bate com um dos aliases
/// (igual, ou contendo o alias), na ordem das colunas.
pub fn pick_value(fields: &RowFields, aliases: &[&str]) -> Option<String> {
    let normalized_aliases: Vec<String> = aliases.iter().map(|a| normalize_key(a)).collect();

    fields
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .find(|(column, _)| {
            let key = normalize_key(column);
            normalized_aliases
                .iter()
                .any(|alias| key == *alias || key.contains(alias.as_str()))
        })
        .map(|(_, value)| value.trim().to_string())
}

/// Colapsa espaços internos e apara. É também a chave de negócio do locatário.
pub fn normalize_tenant_name(value: &str) -> String {
    WHITESPACE_RE.replace_all(value, " ").trim().to_string()
}

fn captured_number(re: &Regex, value: &str) -> Option<u32> {
    re.captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// "B2" -> "B2", "3F A6-1" -> "3F", "15" -> "15F", "Lobby" -> None.
pub fn parse_floor_label(raw: Option<&str>) -> Option<String> {
    let value = raw?.to_uppercase();
    if value.is_empty() {
        return None;
    }

    if let Some(n) = captured_number(&BASEMENT_RE, &value) {
        return Some(format!("B{n}"));
    }
    if let Some(n) = captured_number(&ABOVE_GROUND_RE, &value) {
        return Some(format!("{n}F"));
    }
    captured_number(&PLAIN_NUMBER_RE, &value).map(|n| format!("{n}F"))
}

/// Sem espaços; se houver vários códigos ("A1、A2"), fica o primeiro.
pub fn parse_unit_code(raw: Option<&str>) -> Option<String> {
    let compact: String = raw?.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .split(UNIT_SEPARATORS)
        .find(|token| !token.is_empty())
        .map(str::to_string)
}

pub fn parse_email(raw: Option<&str>) -> Option<String> {
    EMAIL_RE.find(raw?).map(|m| m.as_str().to_string())
}

/// Primeiro trecho com cara de telefone; sem match, devolve o texto aparado.
pub fn parse_phone(raw: Option<&str>) -> Option<String> {
    let compact = normalize_tenant_name(raw?);
    if compact.is_empty() {
        return None;
    }
    match PHONE_RE.find(&compact) {
        Some(m) => Some(m.as_str().trim().to_string()),
        None => Some(compact),
    }
}

pub fn extract_structured_candidate(fields: &RowFields) -> StructuredCandidate {
    let tenant_raw = pick_value(fields, TENANT_ALIASES);
    let floor_raw = pick_value(fields, FLOOR_ALIASES);
    let unit_raw = pick_value(fields, UNIT_ALIASES);
    let contact_name = pick_value(fields, CONTACT_NAME_ALIASES);
    let phone_raw = pick_value(fields, PHONE_ALIASES);
    let email_raw = pick_value(fields, EMAIL_ALIASES);

    StructuredCandidate {
        tenant_name: tenant_raw.map(|t| normalize_tenant_name(&t)).filter(|t| !t.is_empty()),
        floor_label: parse_floor_label(floor_raw.as_deref()),
        unit_code: parse_unit_code(unit_raw.as_deref()),
        contact_name: contact_name.map(|c| normalize_tenant_name(&c)).filter(|c| !c.is_empty()),
        contact_phone: parse_phone(phone_raw.as_deref()),
        contact_email: parse_email(email_raw.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> RowFields {
        RowFields::new(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn parses_floor_labels() {
        assert_eq!(parse_floor_label(Some("B2")).as_deref(), Some("B2"));
        assert_eq!(parse_floor_label(Some("3F A6-1")).as_deref(), Some("3F"));
        assert_eq!(parse_floor_label(Some("15")).as_deref(), Some("15F"));
        assert_eq!(parse_floor_label(Some("Lobby")), None);
        assert_eq!(parse_floor_label(Some("b 03")).as_deref(), Some("B3"));
        assert_eq!(parse_floor_label(Some("07f")).as_deref(), Some("7F"));
        assert_eq!(parse_floor_label(None), None);
    }

    #[test]
    fn extracts_key_fields_by_alias() {
        let row = fields(&[
            ("樓層", "3F"),
            ("戶號", "A6-1"),
            ("商戶", "日商丹下都市建築設計(股)公司台北辦事處"),
            ("公司電話", "02-6608-9169"),
            ("信件", "contact@example.com"),
        ]);
        let candidate = extract_structured_candidate(&row);

        assert_eq!(candidate.floor_label.as_deref(), Some("3F"));
        assert_eq!(candidate.unit_code.as_deref(), Some("A6-1"));
        assert!(candidate.tenant_name.unwrap().contains("日商丹下都市建築設計"));
        assert!(candidate.contact_phone.unwrap().contains("02-6608-9169"));
        assert_eq!(candidate.contact_email.as_deref(), Some("contact@example.com"));
        assert_eq!(candidate.contact_name, None);
    }

    #[test]
    fn column_names_match_after_key_normalization() {
        let row = fields(&[("租戶 名稱（全名）", "  甲   公司 "), ("E-Mail:", "x: Foo.Bar@Mail.COM y")]);
        let candidate = extract_structured_candidate(&row);
        assert_eq!(candidate.tenant_name.as_deref(), Some("甲 公司"));
        assert_eq!(candidate.contact_email.as_deref(), Some("Foo.Bar@Mail.COM"));
    }

    #[test]
    fn empty_values_are_skipped_in_favour_of_later_columns() {
        let row = fields(&[("商戶", ""), ("客戶名稱", "乙公司")]);
        assert_eq!(pick_value(&row, TENANT_ALIASES).as_deref(), Some("乙公司"));
        assert_eq!(pick_value(&row, UNIT_ALIASES), None);
    }

    #[test]
    fn unit_code_takes_first_token() {
        assert_eq!(parse_unit_code(Some(" A 1、A2")).as_deref(), Some("A1"));
        assert_eq!(parse_unit_code(Some("/B3~B5")).as_deref(), Some("B3"));
        assert_eq!(parse_unit_code(Some("   ")), None);
        assert_eq!(parse_unit_code(Some("、，")), None);
    }

    #[test]
    fn phone_falls_back_to_trimmed_text() {
        assert_eq!(parse_phone(Some("TEL: 02-2345-6789 ext")).as_deref(), Some("02-2345-6789"));
        assert_eq!(parse_phone(Some("+886 2 2345 6789#12")).as_deref(), Some("+886 2 2345 6789#12"));
        assert_eq!(parse_phone(Some("  請洽管理室  ")).as_deref(), Some("請洽管理室"));
        assert_eq!(parse_phone(Some("  ")), None);
        assert_eq!(parse_phone(None), None);
    }

    #[test]
    fn rows_without_tenant_columns_yield_no_tenant() {
        let row = fields(&[("樓層", "5F"), ("戶號", "C1")]);
        let candidate = extract_structured_candidate(&row);
        assert_eq!(candidate.tenant_name, None);
        assert_eq!(candidate.floor_label.as_deref(), Some("5F"));
    }
}
