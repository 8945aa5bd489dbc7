//! Analysis prompt construction

use mentiscope_common::db::Student;
use mentiscope_common::Result;
use serde_json::Value;

/// System message sent ahead of every analysis prompt
pub const SYSTEM_MESSAGE: &str = "You are a Neural Architect assistant. Output JSON only.";

const ROLE_AND_DIMENSIONS: &str = r#"You are an expert Child Development Scientist and Neural Readiness Architect.

### CORE MISSION:
Analyze the provided holistic development data across 9 core dimensions to provide a comprehensive growth mapping for the student.

### THE 9 DIMENSIONS:
1. Cognitive Development
2. Academic Progress
3. Academic Intelligence (Learning Strategies, Study Skills, Academic Mindset, Metacognition)
4. Neural & Physiological Health
5. Emotional Regulation
6. Motivation & Agency
7. Social & Communication Skills
8. Empathy & Character
9. Life Skills & Independence

### PHILOSOPHY:
- **No Labels**: Do not diagnose or label. Use descriptive behavioral patterns.
- **Clarity & Reassurance**: Use supportive, explainable, and practical language.
- **Early Signals**: Focus on patterns and trends rather than snapshots.
- **Age-Appropriate**: Tailor insights and actions to the student's grade level (1-12).
"#;

const SECTIONS_AND_SCHEMA: &str = r#"### PROMPT ARCHITECTURE:
1. **Overall Growth Analysis**: Analyze inputs across 9 dimensions. Focus on patterns.
   - Output: summary (3-4 sentences), 2-3 strengths, 2-3 support areas, confidence score (0-100).
2. **Academic Intelligence Deep Dive**: Assess learning strategies, study habits, academic mindset, and metacognition.
   - Output: academic_intelligence_score (0-100), learning_style, study_effectiveness, growth_mindset_level, key_recommendations.
3. **Perception Gap (Synergy Analysis)**: Compare Parent and Student responses. Identify "Blind Spots" where perceptions differ.
   - Output: gap_score (0-100), key_misalignment_area (string), recommendation (string).
4. **Risk Signal Detection**: Identify early risk signals ONLY if multiple indicators align. Explain "Why".
   - Output: Risk name, observations, why it matters, urgency (Low, Watch, Focus).
5. **Personalized Action Map**: specific, achievable, time-bound. Calm language. Age-appropriate for grade level.
   - Include: 3-5 student actions, 2-3 parent actions, 1-2 environment adjustments.
   - Distinguish: "Immediate Trigger" (Day 1) vs "Habit Protocol" (Week 1).
6. **Predictive Growth Trajectory**: Forecast growth if the action plan is followed.
   - Output: current_readiness, projected_30d, projected_90d, primary_growth_driver (string).
7. **Parent Communication Guidance**: Support tone and rhythms.
   - Include: what to encourage, what to avoid, check-in frequency, recommended tone.
8. **Explainability Layer**: For each major insight/suggestion.
   - Include: what was observed, which inputs mattered, why it matters, expected impact.
9. **Dashboard Summary**: Under 120 words. Focus on clarity and reassurance.

### JSON OUTPUT FORMAT:
{
  "readiness_score": int,
  "confidence_level": int,
  "synergy_score": int,
  "dashboard_summary": "string",
  "overall_growth_summary": "string",
  "perception_gap": {
    "gap_score": int,
    "misalignment": "string",
    "synergy_tip": "string"
  },
  "academic_intelligence": {
    "score": int (0-100),
    "learning_style": "Visual" | "Auditory" | "Kinesthetic" | "Mixed",
    "study_effectiveness": "High" | "Moderate" | "Needs Improvement",
    "growth_mindset_level": "Strong" | "Developing" | "Fixed",
    "recommendations": ["string"]
  },
  "trajectory": {
    "current": int,
    "projected_30d": int,
    "projected_90d": int,
    "growth_driver": "string"
  },
  "dimensions": [
    {
      "name": "string",
      "status": "Strong" | "Developing" | "Needs Support",
      "trend": "up" | "down" | "stable",
      "score": int (0-100)
    }
  ],
  "strengths": [
    { "title": "string", "explanation": "string", "dimension": DIMENSION_KEY }
  ],
  "support_areas": [
    { "title": "string", "explanation": "string" }
  ],
  "risks": [
    {
      "name": "string",
      "observations": "string",
      "why_it_matters": "string",
      "urgency": "Low" | "Watch" | "Focus",
      "dimension": DIMENSION_KEY
    }
  ],
  "action_plan": {
    "student_actions": [{ "task": "string", "type": "Immediate" | "Habit" }],
    "parent_actions": [{ "task": "string", "type": "Immediate" | "Habit" }],
    "environment_adjustments": ["string"]
  },
  "communication_guidance": {
    "to_encourage": ["string"],
    "to_avoid": ["string"],
    "frequency": "string",
    "recommended_tone": "string"
  },
  "explainability": [
    {
      "insight": "string",
      "observation": "string",
      "inputs_matter": ["string"],
      "why_it_matters": "string",
      "expected_impact": "string"
    }
  ]
}

DIMENSION_KEY is optional and, when given, one of: "cognitive_development" | "academic_intelligence" | "growth_mindset" | "emotional_regulation" | "sleep_health" | "social_skills" | "executive_function" | "resilience" | "parent_communication".
"#;

/// Build the analysis prompt for one assessment
///
/// `history` holds the data payloads of earlier assessments, newest first.
pub fn build_prompt(student: &Student, current: &Value, history: &[Value]) -> Result<String> {
    let current = serde_json::to_string_pretty(current)?;
    let history = serde_json::to_string_pretty(history)?;

    Ok(format!(
        "{ROLE_AND_DIMENSIONS}\n\
         ### STUDENT CONTEXT:\n\
         - Name: {name}\n\
         - Grade: {grade}\n\
         \n\
         ### DATA SPECTRUM:\n\
         - Current Assessment: {current}\n\
         - Historical Context: {history}\n\
         \n\
         {SECTIONS_AND_SCHEMA}",
        name = student.name,
        grade = student.grade_level,
    ))
}
