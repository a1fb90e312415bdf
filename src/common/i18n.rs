// src/common/i18n.rs

use std::collections::HashMap;

pub const FALLBACK_LANG: &str = "zh";

// Catálogo: (chave, zh, en, pt). `{0}` é substituído pelo argumento do erro.
const MESSAGES: &[(&str, &str, &str, &str)] = &[
    ("validation_error", "匯入參數格式錯誤", "One or more fields are invalid.", "Um ou mais campos são inválidos."),
    ("workbook_decode", "XLSX 解析失敗: {0}", "Could not read workbook: {0}", "Falha ao ler a planilha: {0}"),
    ("no_importable_sheets", "沒有可匯入的工作表（sheet）", "No sheets left to import.", "Nenhuma aba para importar."),
    ("missing_source_path", "請提供 filePath/sourcePath/xlsxPath/path", "Provide filePath/sourcePath/xlsxPath/path.", "Informe filePath/sourcePath/xlsxPath/path."),
    ("source_file_not_found", "找不到來源檔案: {0}", "Source file not found: {0}", "Arquivo de origem não encontrado: {0}"),
    ("building_not_found", "找不到大樓", "Building not found.", "Prédio não encontrado."),
    ("import_batch_not_found", "找不到匯入批次", "Import batch not found.", "Lote de importação não encontrado."),
    ("unsupported_export_scope", "目前僅支援 scope=all（收到 {0}）", "Only scope=all is supported (got {0}).", "Apenas scope=all é suportado (recebido {0})."),
    ("invalid_floor_label", "樓層標籤格式錯誤: {0}", "Invalid floor label: {0}", "Rótulo de andar inválido: {0}"),
    ("internal_error", "發生未預期的錯誤", "An unexpected error occurred.", "Ocorreu um erro inesperado."),
];

/// Mensagens traduzidas por idioma. Fica no `AppState`.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        let mut messages: HashMap<&'static str, HashMap<&'static str, &'static str>> = HashMap::new();
        for &(key, zh, en, pt) in MESSAGES {
            messages.entry("zh").or_default().insert(key, zh);
            messages.entry("en").or_default().insert(key, en);
            messages.entry("pt").or_default().insert(key, pt);
        }
        Self { messages }
    }
}

impl I18nStore {
    pub fn translate(&self, lang: &str, key: &str, arg: Option<&str>) -> String {
        let template = self
            .messages
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .or_else(|| self.messages.get(FALLBACK_LANG).and_then(|c| c.get(key)))
            .copied()
            .unwrap_or(key);

        match arg {
            Some(value) => template.replace("{0}", value),
            None => template.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_chinese_for_unknown_language() {
        let store = I18nStore::default();
        assert_eq!(store.translate("fr", "building_not_found", None), "找不到大樓");
        assert_eq!(store.translate("en", "building_not_found", None), "Building not found.");
    }

    #[test]
    fn unknown_key_echoes_the_key() {
        let store = I18nStore::default();
        assert_eq!(store.translate("en", "nope", None), "nope");
    }
}
