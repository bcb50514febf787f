#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    DetectEncoding,
    DocumentPut,
    DocumentGet,
    Submit,
    SourceExportPo,
    TranslationExportPo,
    TranslationImportPo,
    TranslationProgress,
    TranslationList,
    TranslationSaveTarget,
    Unknown,
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Command::Ping,
            "encoding.detect" => Command::DetectEncoding,
            "document.put" => Command::DocumentPut,
            "document.get" => Command::DocumentGet,
            "submit" => Command::Submit,
            "source.export_po" => Command::SourceExportPo,
            "translation.export_po" => Command::TranslationExportPo,
            "translation.import_po" => Command::TranslationImportPo,
            "translation.progress" => Command::TranslationProgress,
            "translation.list" => Command::TranslationList,
            "translation.save_target" => Command::TranslationSaveTarget,
            _ => Command::Unknown,
        }
    }
}
