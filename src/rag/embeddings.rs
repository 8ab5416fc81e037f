use std::path::Path;

use fastembed::{
    EmbeddingModel, InitOptions, InitOptionsUserDefined, TextEmbedding, TokenizerFiles,
    UserDefinedEmbeddingModel,
};

use crate::config::Settings;
use crate::error::{AssistantError, Result};

pub trait Embedder: Send + Sync {
    fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    fn dimension(&self) -> u64;

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(vec![text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| AssistantError::Embedding("model returned no vector".to_string()))
    }
}

/// Maps a configured model identifier onto a model fastembed can download.
pub fn named_model(identifier: &str) -> Option<EmbeddingModel> {
    let name = identifier
        .rsplit('/')
        .next()
        .unwrap_or(identifier)
        .to_lowercase();
    match name.as_str() {
        "all-minilm-l6-v2" => Some(EmbeddingModel::AllMiniLML6V2),
        "bge-small-en-v1.5" => Some(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Some(EmbeddingModel::BGEBaseENV15),
        _ => None,
    }
}

/// Vector size fastembed publishes for a named model.
pub fn published_dimension(model: &EmbeddingModel) -> Option<u64> {
    TextEmbedding::list_supported_models()
        .into_iter()
        .find(|info| &info.model == model)
        .map(|info| info.dim as u64)
}

/// The model decides the vector size; `EMBEDDING_DIMENSION` may only confirm it.
pub fn resolve_dimension(model_dimension: u64, configured: Option<u64>) -> Result<u64> {
    match configured {
        Some(expected) if expected != model_dimension => Err(AssistantError::Config(format!(
            "EMBEDDING_DIMENSION ({}) does not match the embedding model ({} dimensions)",
            expected, model_dimension
        ))),
        _ => Ok(model_dimension),
    }
}

pub struct FastEmbedder {
    model: TextEmbedding,
    dimension: u64,
}

impl FastEmbedder {
    pub fn new(settings: &Settings) -> Result<Self> {
        let (model, model_dimension) = match &settings.embedding_model_dir {
            Some(dir) => {
                let model = Self::load_local(Path::new(dir))?;
                // User-defined models carry no metadata; measure one vector.
                let sample = model
                    .embed(vec!["dimension check".to_string()], None)
                    .map_err(|e| AssistantError::Embedding(e.to_string()))?;
                let dimension = sample.first().map(|v| v.len() as u64).ok_or_else(|| {
                    AssistantError::Embedding("model returned no vector".to_string())
                })?;
                (model, dimension)
            }
            None => {
                let model_name = named_model(&settings.embedding_model).ok_or_else(|| {
                    AssistantError::Config(format!(
                        "unsupported embedding model: {}",
                        settings.embedding_model
                    ))
                })?;
                let dimension = published_dimension(&model_name).ok_or_else(|| {
                    AssistantError::Config(format!(
                        "no published dimension for {}",
                        settings.embedding_model
                    ))
                })?;
                tracing::info!("Initializing embedding model {}...", settings.embedding_model);
                let model = TextEmbedding::try_new(InitOptions {
                    model_name,
                    show_download_progress: true,
                    ..Default::default()
                })
                .map_err(|e| {
                    AssistantError::Embedding(format!("Failed to initialize embedding model: {}", e))
                })?;
                (model, dimension)
            }
        };

        let dimension = resolve_dimension(model_dimension, settings.embedding_dimension)?;
        tracing::info!("Embedding model initialized successfully ({} dimensions)", dimension);
        Ok(Self { model, dimension })
    }

    fn load_local(model_dir: &Path) -> Result<TextEmbedding> {
        tracing::info!("Initializing embedding model from {}...", model_dir.display());

        if !model_dir.exists() {
            return Err(AssistantError::Config(format!(
                "Model directory not found: {}",
                model_dir.display()
            )));
        }

        let read = |name: &str| {
            std::fs::read(model_dir.join(name))
                .map_err(|e| AssistantError::Embedding(format!("Failed to read {}: {}", name, e)))
        };

        let user_model = UserDefinedEmbeddingModel {
            onnx_file: read("model.onnx")?,
            tokenizer_files: TokenizerFiles {
                tokenizer_file: read("tokenizer.json")?,
                config_file: read("config.json")?,
                special_tokens_map_file: read("special_tokens_map.json")?,
                tokenizer_config_file: read("tokenizer_config.json")?,
            },
        };

        TextEmbedding::try_new_from_user_defined(user_model, InitOptionsUserDefined::default())
            .map_err(|e| AssistantError::Embedding(format!("Failed to initialize embedding model: {}", e)))
    }
}

impl Embedder for FastEmbedder {
    fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.model
            .embed(texts, None)
            .map_err(|e| AssistantError::Embedding(e.to_string()))
    }

    fn dimension(&self) -> u64 {
        self.dimension
    }
}
