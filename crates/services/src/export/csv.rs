use csv::Writer;
use thiserror::Error;

use crate::attendance::types::AttendanceSnapshot;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV buffer error: {0}")]
    Buffer(String),
}

/// Renders a classified roster as a CSV download. One row per participant,
/// a blank separator, then the aggregate counts.
pub fn export_attendance(snapshot: &AttendanceSnapshot) -> Result<Vec<u8>, ExportError> {
    let mut wtr = Writer::from_writer(vec![]);

    wtr.write_record([
        "Name",
        "Email",
        "Student ID",
        "Department",
        "Sessions",
        "Total Minutes",
        "Percentage",
        "Status",
    ])?;

    for p in &snapshot.participants {
        let sessions: String = p
            .sessions
            .iter()
            .map(|s| {
                let join = s
                    .join_time
                    .map(|t| t.format("%H:%M").to_string())
                    .unwrap_or_else(|| "?".to_string());
                let leave = s
                    .leave_time
                    .map(|t| t.format("%H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                format!("{}-{}", join, leave)
            })
            .collect::<Vec<_>>()
            .join("; ");

        let row: Vec<String> = vec![
            p.name.clone(),
            p.email.clone().unwrap_or_default(),
            p.student_info
                .as_ref()
                .map(|s| s.student_id.clone())
                .unwrap_or_default(),
            p.student_info
                .as_ref()
                .and_then(|s| s.department.clone())
                .unwrap_or_default(),
            sessions,
            p.total_session_duration.to_string(),
            format!("{}%", p.attendance_percentage),
            p.attendance_status.to_string(),
        ];
        wtr.write_record(&row)?;
    }

    let stats = &snapshot.statistics;
    wtr.write_record([""; 8])?;
    let summary: Vec<String> = vec![
        "Total".to_string(),
        stats.total.to_string(),
        "Present".to_string(),
        stats.present.to_string(),
        "Absent".to_string(),
        stats.absent.to_string(),
        "Average".to_string(),
        format!("{}%", stats.average_percentage),
    ];
    wtr.write_record(&summary)?;

    wtr.into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))
}
