use serde::{Deserialize, Serialize};
use skyview_base::{AnnotationId, Point3};

pub const DEFAULT_ANNOTATION_TEXT: &str = "New annotation";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub position: Point3,
    pub text: String,
}

impl Annotation {
    pub fn new(position: Point3) -> Self {
        Self {
            id: AnnotationId::new(),
            position,
            text: DEFAULT_ANNOTATION_TEXT.to_string(),
        }
    }
}
