use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use rules::Intent;

use crate::MatchError;

/// A labeled exemplar query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentDocument {
    pub id: String,
    pub intent: Intent,
    pub text: String,
}

impl IntentDocument {
    pub fn new(id: impl Into<String>, intent: Intent, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            intent,
            text: text.into(),
        }
    }

    fn validate(&self) -> Result<(), MatchError> {
        if self.id.trim().is_empty() {
            return Err(MatchError::InvalidDocument {
                id: self.id.clone(),
                reason: "empty id".into(),
            });
        }
        if self.text.trim().is_empty() {
            return Err(MatchError::InvalidDocument {
                id: self.id.clone(),
                reason: "empty text".into(),
            });
        }
        Ok(())
    }
}

/// Id -> exemplar map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntentCorpus {
    documents: HashMap<String, IntentDocument>,
}

impl IntentCorpus {
    /// Build from a list; ids must be unique.
    pub fn from_documents<I>(documents: I) -> Result<Self, MatchError>
    where
        I: IntoIterator<Item = IntentDocument>,
    {
        let mut corpus = Self::default();
        for doc in documents {
            doc.validate()?;
            if corpus.documents.contains_key(&doc.id) {
                return Err(MatchError::DuplicateDocument(doc.id));
            }
            corpus.documents.insert(doc.id.clone(), doc);
        }
        Ok(corpus)
    }

    /// The bundled construction-materials exemplars.
    pub fn builtin() -> Self {
        let documents = BUILTIN
            .iter()
            .map(|(id, intent, text)| {
                (
                    (*id).to_string(),
                    IntentDocument::new(*id, *intent, *text),
                )
            })
            .collect();
        Self { documents }
    }

    /// Load a JSON array of `{ id, intent, text }`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, MatchError> {
        let content = fs::read_to_string(path)?;
        let docs: Vec<IntentDocument> =
            serde_json::from_str(&content).map_err(|e| MatchError::Parse(e.to_string()))?;
        Self::from_documents(docs)
    }

    /// Load a YAML sequence of `{ id, intent, text }`.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, MatchError> {
        let content = fs::read_to_string(path)?;
        let docs: Vec<IntentDocument> =
            serde_yaml::from_str(&content).map_err(|e| MatchError::Parse(e.to_string()))?;
        Self::from_documents(docs)
    }

    /// Pick the loader by file extension (`.json`, `.yaml`, `.yml`).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MatchError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            other => Err(MatchError::Parse(format!(
                "unsupported corpus file extension: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }

    /// Insert or replace by id. Returns the previous document, if any.
    pub fn upsert(&mut self, doc: IntentDocument) -> Result<Option<IntentDocument>, MatchError> {
        doc.validate()?;
        Ok(self.documents.insert(doc.id.clone(), doc))
    }

    pub fn get(&self, id: &str) -> Option<&IntentDocument> {
        self.documents.get(id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IntentDocument> {
        self.documents.values()
    }

    /// Documents ordered by id, for reproducible iteration.
    pub fn sorted(&self) -> Vec<IntentDocument> {
        let mut docs: Vec<IntentDocument> = self.documents.values().cloned().collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        docs
    }
}

const BUILTIN: &[(&str, Intent, &str)] = &[
    ("A1", Intent::DirectProductSearch, "cemento holcim 50kg"),
    ("A2", Intent::DirectProductSearch, "tubería pvc 1 pulgada para agua potable"),
    ("A3", Intent::DirectProductSearch, "pintura blanca lavable para interiores"),
    ("A4", Intent::DirectProductSearch, "plancha de yeso 1/2"),
    ("A5", Intent::DirectProductSearch, "interruptor eléctrico blanco schneider"),
    ("B1", Intent::AttributeBasedSearch, "cerámica 60x60 antideslizante"),
    ("B2", Intent::AttributeBasedSearch, "pernos galvanizados 3/8 x 4"),
    ("B3", Intent::AttributeBasedSearch, "ventanas aluminio serie 25"),
    ("B4", Intent::AttributeBasedSearch, "cables eléctricos 12 AWG"),
    ("B5", Intent::AttributeBasedSearch, "malla electrosoldada 6mm"),
    ("C1", Intent::ProblemSolvingSearch, "material para nivelar piso desnivelado"),
    ("C2", Intent::ProblemSolvingSearch, "cómo impermeabilizar terraza"),
    ("C3", Intent::ProblemSolvingSearch, "solución para humedad en paredes"),
    ("C4", Intent::ProblemSolvingSearch, "qué usar para pegar cerámica en exterior"),
    ("C5", Intent::ProblemSolvingSearch, "aislamiento acústico para paredes delgadas"),
    ("D1", Intent::ComparisonSearch, "pintura acrílica vs pintura vinílica"),
    ("D2", Intent::ComparisonSearch, "cemento portland vs cemento rápido"),
    ("D3", Intent::ComparisonSearch, "pvc vs cpvc para agua caliente"),
    ("D4", Intent::ComparisonSearch, "mejor marca de drywall en Ecuador"),
    ("D5", Intent::ComparisonSearch, "qué es mejor: tubería HDPE o PVC"),
    ("E1", Intent::ProjectBasedSearch, "materiales para construir pérgola"),
    ("E2", Intent::ProjectBasedSearch, "qué necesito para instalar un baño completo"),
    ("E3", Intent::ProjectBasedSearch, "herramientas para remodelar cocina"),
    ("E4", Intent::ProjectBasedSearch, "equipos para construcción de casa de 2 pisos"),
    ("E5", Intent::ProjectBasedSearch, "materiales para hacer un contrapiso"),
    ("F1", Intent::BulkOrBudgetSearch, "cemento al por mayor Quito"),
    ("F2", Intent::BulkOrBudgetSearch, "materiales económicos para cerramiento"),
    ("F3", Intent::BulkOrBudgetSearch, "pintura barata para obra gris"),
    ("F4", Intent::BulkOrBudgetSearch, "paquete completo para instalación de tuberías"),
    ("F5", Intent::BulkOrBudgetSearch, "presupuesto materiales para 20 m2 de cerámica"),
    ("G1", Intent::PriceQuery, "precio de cemento Holcim 50kg"),
    ("G2", Intent::PriceQuery, "cuánto cuesta la tubería PVC 1 pulgada"),
    ("G3", Intent::PriceQuery, "pintura para interiores precio por galón"),
    ("G4", Intent::PriceQuery, "precio de cerámica 60x60 antideslizante"),
    ("G5", Intent::PriceQuery, "cuánto valen las láminas de drywall 1/2"),
    ("H1", Intent::Navigation, "Ir al panel principal"),
    ("H2", Intent::Navigation, "Muéstrame la página de productos"),
    ("H3", Intent::Navigation, "Abrir sección de facturas"),
    ("I1", Intent::NavigationWithParameters, "Ver facturas del último mes"),
    ("I2", Intent::NavigationWithParameters, "Muéstrame productos filtrados por categoría eléctricos"),
    ("I3", Intent::NavigationWithParameters, "Listar cotizaciones entre enero y marzo"),
];
