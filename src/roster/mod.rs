//! Static exam and student definitions.
//!
//! Loaded once at startup from JSON files in the data directory:
//! `exam_details.json` (exams and their questions) and
//! `students_details.json` (the enrolled roster). The audit endpoint uses
//! these to know which `(question, student)` keys to pull from the ledger.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Exam {
    #[serde(rename = "examID")]
    pub exam_id: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Question {
    #[serde(rename = "questionID")]
    pub question_id: String,
    pub question: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Student {
    #[serde(rename = "studentID")]
    pub student_id: String,
    #[serde(rename = "studentName")]
    pub student_name: String,
}

#[derive(Debug, Deserialize)]
struct ExamsFile {
    exams: Vec<Exam>,
}

#[derive(Debug, Deserialize)]
struct StudentsFile {
    students: Vec<Student>,
}

/// Immutable roster shared across requests.
#[derive(Debug, Clone)]
pub struct Roster {
    pub exams: Vec<Exam>,
    pub students: Vec<Student>,
}

impl Roster {
    /// Load `exam_details.json` and `students_details.json` from
    /// `data_dir`. Both files must exist and parse — a daemon with no
    /// roster cannot serve audits.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let exams_path = data_dir.join("exam_details.json");
        let exams: ExamsFile = read_json(&exams_path)?;

        let students_path = data_dir.join("students_details.json");
        let students: StudentsFile = read_json(&students_path)?;

        Ok(Self {
            exams: exams.exams,
            students: students.students,
        })
    }

    pub fn exam(&self, exam_id: &str) -> Option<&Exam> {
        self.exams.iter().find(|e| e.exam_id == exam_id)
    }

    pub fn question_ids(&self, exam: &Exam) -> Vec<String> {
        exam.questions.iter().map(|q| q.question_id.clone()).collect()
    }

    pub fn student_ids(&self) -> Vec<String> {
        self.students.iter().map(|s| s.student_id.clone()).collect()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_roster(dir: &Path) {
        std::fs::write(
            dir.join("exam_details.json"),
            r#"{"exams":[{"examID":"exam170126","questions":[{"questionID":"q1","question":"What is 2+2?"}]}]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("students_details.json"),
            r#"{"students":[{"studentID":"s1","studentName":"Ada"},{"studentID":"s2","studentName":"Grace"}]}"#,
        )
        .unwrap();
    }

    #[test]
    fn loads_exams_and_students() {
        let dir = tempfile::tempdir().unwrap();
        write_roster(dir.path());

        let roster = Roster::load(dir.path()).unwrap();
        assert_eq!(roster.exams.len(), 1);
        assert_eq!(roster.students.len(), 2);

        let exam = roster.exam("exam170126").unwrap();
        assert_eq!(roster.question_ids(exam), vec!["q1"]);
        assert_eq!(roster.student_ids(), vec!["s1", "s2"]);
    }

    #[test]
    fn unknown_exam_is_none() {
        let dir = tempfile::tempdir().unwrap();
        write_roster(dir.path());
        let roster = Roster::load(dir.path()).unwrap();
        assert!(roster.exam("nope").is_none());
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = Roster::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("exam_details.json"));
    }
}
