use serde::Serialize;

use crate::detection::domain::face_record::FaceRecord;

/// Plain, serializable view of one detection, for display and JSON output.
#[derive(Clone, Debug, Serialize)]
pub struct FaceInfo {
    pub index: usize,
    pub bbox: [f32; 4],
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<Vec<[f32; 2]>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<&'static str>,
}

/// Flattens detection output into report rows, one per face, in detector
/// order. Read-only over the records; never touches the compositor.
pub fn report(faces: &[FaceRecord]) -> Vec<FaceInfo> {
    faces
        .iter()
        .enumerate()
        .map(|(index, face)| {
            let bbox = face.bbox();
            FaceInfo {
                index,
                bbox: [bbox.x1, bbox.y1, bbox.x2, bbox.y2],
                score: face.detection_score(),
                landmarks: face
                    .landmarks()
                    .map(|points| points.iter().map(|&(x, y)| [x, y]).collect()),
                age: face.age(),
                gender: face.gender().map(|g| g.label()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_record::{BoundingBox, FaceEmbedding, Gender};
    use approx::assert_relative_eq;

    #[test]
    fn test_report_empty() {
        assert!(report(&[]).is_empty());
    }

    #[test]
    fn test_report_full_record() {
        let face = FaceRecord::new(
            BoundingBox::new(10.0, 20.0, 60.0, 80.0),
            Some(vec![(15.0, 30.0), (45.0, 30.0)]),
            0.93,
            Some(42),
            Some(Gender::Male),
            FaceEmbedding::new(vec![0.0; 512]),
        );

        let rows = report(&[face]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].index, 0);
        assert_eq!(rows[0].bbox, [10.0, 20.0, 60.0, 80.0]);
        assert_relative_eq!(rows[0].score, 0.93);
        assert_eq!(rows[0].landmarks.as_ref().unwrap().len(), 2);
        assert_eq!(rows[0].age, Some(42));
        assert_eq!(rows[0].gender, Some("male"));
    }

    #[test]
    fn test_report_sparse_record_serializes_without_optionals() {
        let face = FaceRecord::new(
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            None,
            0.5,
            None,
            None,
            FaceEmbedding::new(vec![]),
        );

        let rows = report(&[face]);
        let json = serde_json::to_string(&rows[0]).unwrap();
        assert!(!json.contains("landmarks"));
        assert!(!json.contains("age"));
        assert!(!json.contains("gender"));
        assert!(json.contains("\"index\":0"));
    }

    #[test]
    fn test_report_preserves_detector_order() {
        let face = |x1: f32| {
            FaceRecord::new(
                BoundingBox::new(x1, 0.0, x1 + 10.0, 10.0),
                None,
                0.5,
                None,
                None,
                FaceEmbedding::new(vec![]),
            )
        };
        let rows = report(&[face(200.0), face(0.0), face(100.0)]);
        assert_eq!(rows[0].bbox[0], 200.0);
        assert_eq!(rows[1].bbox[0], 0.0);
        assert_eq!(rows[2].bbox[0], 100.0);
        assert_eq!(rows[2].index, 2);
    }
}
