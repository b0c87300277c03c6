//! Analysis Gateway
//!
//! Builds a request for each analysis shape, sends it to the provider and
//! runs the reply through the defensive decoder. Provider faults propagate;
//! malformed replies become `None`.

use ananse_common::{DriverIdentity, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::{ComplexViolationAnalysis, MediaAttachment, PhoneUseAnalysis};
use crate::parse::decode_response;
use crate::prompts;
use crate::provider::{
    GenerateRequest, GenerationConfig, ImageConfig, InferenceProvider, Part, ThinkingConfig,
};
use crate::schema;

pub const DEFAULT_PRO_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_FLASH_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

const COMPOSITE_MAX_OUTPUT_TOKENS: u32 = 16_000;
const COMPOSITE_THINKING_BUDGET: u32 = 4_000;
const EVIDENCE_ASPECT_RATIO: &str = "16:9";

/// Model names used per analysis shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSet {
    /// Composite violation analysis
    pub pro: String,

    /// Identity and behavior analysis
    pub flash: String,

    /// Evidence image generation
    pub image: String,
}

impl Default for ModelSet {
    fn default() -> Self {
        Self {
            pro: DEFAULT_PRO_MODEL.to_string(),
            flash: DEFAULT_FLASH_MODEL.to_string(),
            image: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }
}

pub struct AnalysisGateway {
    provider: Arc<dyn InferenceProvider>,
    models: ModelSet,
}

impl AnalysisGateway {
    pub fn new(provider: Arc<dyn InferenceProvider>, models: ModelSet) -> Self {
        Self { provider, models }
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    /// Composite evidence review. The image is optional; without one the
    /// provider works from the instruction alone.
    pub async fn analyze_complex_violation(
        &self,
        instruction: Option<&str>,
        image: Option<&MediaAttachment>,
    ) -> Result<Option<ComplexViolationAnalysis>> {
        let mut parts = vec![Part::text(prompts::compose(
            prompts::COMPLEX_VIOLATION_DIRECTIVE,
            instruction,
        ))];
        parts.extend(image.map(Part::media));

        let mut config = GenerationConfig::json(schema::complex_violation_schema());
        config.max_output_tokens = Some(COMPOSITE_MAX_OUTPUT_TOKENS);
        config.thinking_config = Some(ThinkingConfig {
            thinking_budget: COMPOSITE_THINKING_BUDGET,
        });

        let analysis: Option<ComplexViolationAnalysis> =
            self.analyze(&self.models.pro, parts, config).await?;

        if let Some(a) = &analysis {
            info!(
                "Composite analysis: {} ({:.2}) plate {}",
                a.violation_type, a.confidence_score, a.vehicle.plate
            );
        }

        Ok(analysis)
    }

    /// Driver identity verification from a cabin image
    pub async fn identify_driver(
        &self,
        instruction: Option<&str>,
        image: &MediaAttachment,
    ) -> Result<Option<DriverIdentity>> {
        let parts = vec![
            Part::text(prompts::compose(prompts::IDENTITY_DIRECTIVE, instruction)),
            Part::media(image),
        ];

        self.analyze(
            &self.models.flash,
            parts,
            GenerationConfig::json(schema::identity_schema()),
        )
        .await
    }

    /// Phone use and gaze analysis from cabin video or a still
    pub async fn analyze_behavior(
        &self,
        instruction: Option<&str>,
        media: &MediaAttachment,
    ) -> Result<Option<PhoneUseAnalysis>> {
        let parts = vec![
            Part::text(prompts::compose(prompts::BEHAVIOR_DIRECTIVE, instruction)),
            Part::media(media),
        ];

        self.analyze(
            &self.models.flash,
            parts,
            GenerationConfig::json(schema::behavior_schema()),
        )
        .await
    }

    /// Render an evidence view of `prompt`, returned as a `data:` URL.
    /// `None` when the provider sends back no image.
    pub async fn generate_evidence_image(&self, prompt: &str) -> Result<Option<String>> {
        let request = GenerateRequest {
            model: self.models.image.clone(),
            system_instruction: None,
            parts: vec![Part::text(prompts::evidence_image_prompt(prompt))],
            config: GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: EVIDENCE_ASPECT_RATIO.to_string(),
                }),
                ..Default::default()
            },
        };

        let reply = self.provider.generate(&request).await?;
        let url = reply.inline_data.first().map(|data| data.to_data_url());

        if url.is_none() {
            warn!("Provider returned no image for evidence prompt");
        }

        Ok(url)
    }

    async fn analyze<T: DeserializeOwned>(
        &self,
        model: &str,
        parts: Vec<Part>,
        config: GenerationConfig,
    ) -> Result<Option<T>> {
        let request = GenerateRequest {
            model: model.to_string(),
            system_instruction: Some(prompts::SYSTEM_MESSAGE.to_string()),
            parts,
            config,
        };

        let reply = self.provider.generate(&request).await?;
        Ok(decode_response(reply.text.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{InlineData, ProviderReply};
    use ananse_common::{Error, OcclusionType};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Provider that answers every request with a canned reply
    pub struct StubProvider {
        reply: std::result::Result<ProviderReply, String>,
        pub requests: Mutex<Vec<GenerateRequest>>,
    }

    impl StubProvider {
        pub fn text(text: &str) -> Self {
            Self::reply(ProviderReply {
                text: Some(text.to_string()),
                inline_data: Vec::new(),
            })
        }

        pub fn reply(reply: ProviderReply) -> Self {
            Self {
                reply: Ok(reply),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn last_request(&self) -> GenerateRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl InferenceProvider for StubProvider {
        async fn generate(&self, request: &GenerateRequest) -> Result<ProviderReply> {
            self.requests.lock().unwrap().push(request.clone());
            self.reply.clone().map_err(Error::Provider)
        }
    }

    fn gateway(stub: &Arc<StubProvider>) -> AnalysisGateway {
        AnalysisGateway::new(stub.clone(), ModelSet::default())
    }

    fn jpeg() -> MediaAttachment {
        MediaAttachment::new("image/jpeg", "/9j/").unwrap()
    }

    const IDENTITY: &str = r#"```json
    {
        "idConfirmed": true,
        "matchConfidence": 0.91,
        "occlusionDetected": true,
        "occlusionType": "SUNGLASSES",
        "occlusionResilienceScore": 0.7,
        "reasoning": "Jawline and nose bridge match.",
    }
    ```"#;

    #[tokio::test]
    async fn test_identify_driver_decodes_fenced_reply() {
        let stub = Arc::new(StubProvider::text(IDENTITY));
        let identity = gateway(&stub)
            .identify_driver(Some("check the cap"), &jpeg())
            .await
            .unwrap()
            .unwrap();

        assert!(identity.id_confirmed);
        assert_eq!(identity.occlusion_type, Some(OcclusionType::Sunglasses));
        assert!(identity.identified_name.is_none());

        let request = stub.last_request();
        assert_eq!(request.model, DEFAULT_FLASH_MODEL);
        assert_eq!(request.system_instruction.as_deref(), Some(prompts::SYSTEM_MESSAGE));
        assert!(request.parts[0].text.as_deref().unwrap().ends_with("check the cap"));
        assert_eq!(request.parts[1].inline_data.as_ref().unwrap().mime_type, "image/jpeg");
        assert_eq!(
            request.config.response_mime_type.as_deref(),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn test_malformed_reply_is_absent() {
        let stub = Arc::new(StubProvider::text("not json at all"));
        let result = gateway(&stub).analyze_behavior(None, &jpeg()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_missing_text_is_absent() {
        let stub = Arc::new(StubProvider::reply(ProviderReply::default()));
        let result = gateway(&stub)
            .analyze_complex_violation(None, None)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_composite_uses_pro_model_without_image() {
        let stub = Arc::new(StubProvider::text("{}"));
        let result = gateway(&stub)
            .analyze_complex_violation(Some("Kasoa toll gate"), None)
            .await
            .unwrap();

        // `{}` is valid JSON but misses every required section
        assert!(result.is_none());

        let request = stub.last_request();
        assert_eq!(request.model, DEFAULT_PRO_MODEL);
        assert_eq!(request.parts.len(), 1);
        assert_eq!(request.config.max_output_tokens, Some(COMPOSITE_MAX_OUTPUT_TOKENS));
        assert_eq!(
            request.config.response_schema,
            Some(schema::complex_violation_schema())
        );
    }

    #[tokio::test]
    async fn test_provider_fault_propagates() {
        let stub = Arc::new(StubProvider::failing("503 Service Unavailable"));
        let err = gateway(&stub)
            .identify_driver(None, &jpeg())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider(msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_evidence_image_data_url() {
        let stub = Arc::new(StubProvider::reply(ProviderReply {
            text: Some("Here is your image".to_string()),
            inline_data: vec![InlineData {
                mime_type: "image/png".to_string(),
                data: "iVBO".to_string(),
            }],
        }));

        let url = gateway(&stub)
            .generate_evidence_image("a silver Civic at 124 km/h")
            .await
            .unwrap();
        assert_eq!(url.as_deref(), Some("data:image/png;base64,iVBO"));

        let request = stub.last_request();
        assert_eq!(request.model, DEFAULT_IMAGE_MODEL);
        assert!(request.system_instruction.is_none());
        assert_eq!(
            request.config.image_config.as_ref().unwrap().aspect_ratio,
            EVIDENCE_ASPECT_RATIO
        );
    }

    #[tokio::test]
    async fn test_evidence_image_without_image_part() {
        let stub = Arc::new(StubProvider::text("I cannot draw that"));
        let url = gateway(&stub).generate_evidence_image("anything").await.unwrap();
        assert!(url.is_none());
    }
}
