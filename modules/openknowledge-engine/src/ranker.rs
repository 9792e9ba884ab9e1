use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::embedder::TextEmbedder;
use crate::traits::SemanticRanker;

/// Candidate forum topics: subreddits where people ask how to learn things.
pub const EDU_SUBREDDITS: &[&str] = &[
    // General
    "AskReddit", "IWantToLearn", "TodayILearned", "ExplainLikeImFive", "Showerthoughts",
    "riddles", "Futurology", "Science", "EverythingScience", "ScienceSubreddits",
    // Natural sciences
    "askscience", "biology", "chemistry", "physics", "geology", "astronomy",
    "space", "spaceflight", "astrophysics", "cosmology", "climate", "oceanography",
    "neuroscience", "ecology", "evolution", "earthscience", "marinebiology", "paleontology",
    // Formal, computational, engineering
    "mathematics", "math", "learnmath", "askmath", "statistics", "dataisbeautiful",
    "datascience", "MachineLearning", "artificial", "computerscience", "programming",
    "learnprogramming", "algorithms", "coding", "Cybersecurity", "Engineering",
    "ElectricalEngineering", "MechanicalEngineering", "ComputerEngineering",
    "AstronomyEngineering",
    // Philosophy
    "philosophy", "askphilosophy", "philosophyofscience", "Existentialism", "Stoicism",
    "Ethics", "logic", "CriticalThinking", "philosophymemes", "BadPhilosophy",
    // History and humanities
    "History", "AskHistorians", "Archaeology", "Anthropology", "Linguistics",
    "LanguageLearning", "Literature", "ArtHistory", "PhilosophyofHistory", "Geography",
    "ClassicalHistory", "MedievalHistory", "ModernHistory", "WorldHistory",
    // Social sciences
    "Psychology", "CognitiveScience", "BehavioralScience", "Sociology", "Economics",
    "PoliticalScience", "Psychonaut",
    // Education
    "education", "edtech", "homeschool", "teaching", "StudyTips", "AcademicPhilosophy",
    "AcademicPsychology", "HigherEducation",
    // Specialised
    "asksciencepolicy", "asklinguistics", "AskPhysics", "AskBiology", "AskChemistry",
    "AskEngineers", "AskHistologists", "AskComputerscience", "AskStatistics", "Chemhelp",
    "Biotech", "Bioinformatics", "CognitiveComputing", "MachineLearningTheory",
    "NeuralNetworks", "DeepLearning", "ReinforcementLearning", "QuantumComputing",
    "QuantumMechanics", "PhilosophicalQuestions", "Epistemology", "Metaphysics",
];

/// Ranks a fixed topic list by embedding similarity. Topic vectors are
/// computed on first use and kept for the life of the handle.
pub struct EmbeddingRanker {
    embedder: Arc<dyn TextEmbedder>,
    topics: Vec<String>,
    topic_vectors: OnceCell<Vec<Vec<f32>>>,
}

impl EmbeddingRanker {
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self::with_topics(embedder, EDU_SUBREDDITS.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_topics(embedder: Arc<dyn TextEmbedder>, topics: Vec<String>) -> Self {
        Self {
            embedder,
            topics,
            topic_vectors: OnceCell::new(),
        }
    }

    async fn topic_vectors(&self) -> Result<&Vec<Vec<f32>>> {
        self.topic_vectors
            .get_or_try_init(|| async {
                info!(topics = self.topics.len(), "ranker: embedding candidate topics");
                let vectors = self.embedder.embed_batch(self.topics.clone()).await?;
                if vectors.len() != self.topics.len() {
                    bail!(
                        "embedder returned {} vectors for {} topics",
                        vectors.len(),
                        self.topics.len()
                    );
                }
                Ok(vectors)
            })
            .await
    }
}

#[async_trait]
impl SemanticRanker for EmbeddingRanker {
    async fn rank(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        let topic_vectors = self.topic_vectors().await?;
        let query_vector = self.embedder.embed(query).await?;

        let mut scored: Vec<(&String, f32)> = self
            .topics
            .iter()
            .zip(topic_vectors)
            .map(|(topic, vector)| (topic, cosine_similarity(&query_vector, vector)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);

        debug!(query, topics = ?scored, "ranker: ranked topics");
        Ok(scored.into_iter().map(|(topic, _)| topic.clone()).collect())
    }

    async fn similarity(&self, query: &str, texts: &[String]) -> Result<Vec<f32>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let query_vector = self.embedder.embed(query).await?;
        let vectors = self.embedder.embed_batch(texts.to_vec()).await?;
        Ok(vectors
            .iter()
            .map(|v| cosine_similarity(&query_vector, v))
            .collect())
    }
}

/// Zero when either vector has no magnitude or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
