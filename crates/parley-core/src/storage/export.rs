use crate::config::{ChatSettings, PartialSettings};
use crate::conversation::Conversation;
use crate::error::ParleyError;
use crate::storage::Persistence;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shape of an export file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub conversations: Vec<Conversation>,
    pub settings: ChatSettings,
    pub exported_at: DateTime<Utc>,
}

/// Import side: every section is optional.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ImportBundle {
    conversations: Option<Vec<Conversation>>,
    settings: Option<PartialSettings>,
}

/// What an import actually applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportReport {
    /// Number of conversations written, if the section was present.
    pub conversations: Option<usize>,
    pub settings: bool,
}

impl Persistence {
    pub fn export_bundle(&self) -> ExportBundle {
        ExportBundle {
            conversations: self.conversations(),
            settings: self.settings(),
            exported_at: Utc::now(),
        }
    }

    /// Pretty-printed JSON of all conversations and the current settings.
    pub fn export(&self) -> Result<String, ParleyError> {
        Ok(serde_json::to_string_pretty(&self.export_bundle())?)
    }

    /// Apply an export file. Conversations are replaced wholesale, settings
    /// are merged over the current ones; missing sections are left alone.
    /// Nothing is written unless the whole document parses.
    pub fn import(&self, json: &str) -> Result<ImportReport, ParleyError> {
        let bundle: ImportBundle =
            serde_json::from_str(json).map_err(|e| ParleyError::Import(e.to_string()))?;

        let mut report = ImportReport::default();

        if let Some(conversations) = bundle.conversations {
            self.save_conversations(&conversations);
            report.conversations = Some(conversations.len());
        }

        if let Some(settings) = bundle.settings {
            self.save_settings(&settings);
            report.settings = true;
        }

        tracing::info!(
            conversations = ?report.conversations,
            settings = report.settings,
            "Imported data"
        );

        Ok(report)
    }
}
