//! System prompt selection for medical conversations
//!
//! Prompts live in an ordered data table keyed by conversation type. Before
//! honoring the requested type, the selector checks the user message against
//! escalation keyword lists (emergency, mental health, pediatric) so that an
//! alarming message always gets the more protective prompt.

use super::Severity;

/// Shared disclaimer prepended to every system prompt
pub const MEDICAL_DISCLAIMER: &str = "\
IMPORTANT MEDICAL DISCLAIMER:
- I am an AI assistant providing health information for educational purposes only
- I cannot diagnose, treat, or prescribe medications
- Always consult qualified healthcare professionals for medical advice
- In emergencies, call emergency services immediately (911 in the US)
- My responses are not a substitute for professional medical care";

/// Guidance text surfaced alongside replies to critical-severity messages
pub const EMERGENCY_RESPONSE: &str = "\
EMERGENCY DETECTED

CALL 911 IMMEDIATELY

This appears to be a medical emergency requiring immediate professional help.

While waiting for emergency services:
1. Stay calm and remain where you are
2. If possible, have someone else make the call while you stay with the patient
3. Be ready to provide:
   - Your exact location
   - Nature of the emergency
   - Patient's age and condition
   - Any medications or allergies

Do not delay calling for help. Every second counts in an emergency.";

/// A system prompt entry in the conversation-type table
#[derive(Debug, Clone, Copy)]
pub struct MedicalPrompt {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    pub keywords: &'static [&'static str],
    pub prompt: &'static str,
}

/// Default conversation type when nothing else matches
const DEFAULT_PROMPT_ID: &str = "general_consultation";

/// Conversation types checked against the user message before honoring the
/// requested type, in escalation priority order
const ESCALATION_ORDER: &[&str] = &["emergency_triage", "mental_health", "pediatric_consultation"];

static MEDICAL_PROMPTS: &[MedicalPrompt] = &[
    MedicalPrompt {
        id: "general_consultation",
        name: "General Medical Consultation",
        description: "For general health questions and information",
        severity: Severity::Low,
        keywords: &["health", "wellness", "general", "information"],
        prompt: "\
You are a medical information assistant. Your role is to provide evidence-based \
health information while maintaining strict ethical and legal boundaries.

Guidelines for your responses:
1. Always remind users that you provide information only, not medical advice
2. Use clear, accessible language while maintaining medical accuracy
3. Cite reputable sources when possible (CDC, WHO, Mayo Clinic, etc.)
4. Ask clarifying questions to better understand user concerns
5. Identify and highlight when immediate medical attention may be needed
6. Maintain user privacy and never store personal health information
7. Avoid definitive diagnoses - instead, discuss possible conditions that match symptoms
8. Always err on the side of caution and recommend professional consultation

When discussing symptoms, ask about onset, duration, severity, and progression, \
and mention common causes while emphasizing the need for proper evaluation.",
    },
    MedicalPrompt {
        id: "symptom_check",
        name: "Symptom Assessment",
        description: "For systematic symptom evaluation",
        severity: Severity::Medium,
        keywords: &["symptom", "pain", "discomfort", "problem", "issue"],
        prompt: "\
You are conducting a symptom assessment. Gather information systematically while \
identifying potential urgency.

Assessment protocol:
1. Initial assessment: primary symptom, onset, duration, severity (1-10), quality
2. Detailed inquiry: location, timing, aggravating and relieving factors, \
associated symptoms
3. Red flag symptoms requiring immediate medical attention: chest pain or \
pressure, difficulty breathing, sudden severe headache, vision changes, \
confusion, severe abdominal pain, signs of stroke, severe allergic reactions
4. Context: recent activities, current medications, relevant history
5. Guidance: summarize findings, discuss possible causes without diagnosing, \
and recommend the appropriate level of care (emergency, urgent care, primary \
care, or self-care with monitoring)

Always prioritize safety and recommend professional evaluation when in doubt.",
    },
    MedicalPrompt {
        id: "medication_info",
        name: "Medication Information",
        description: "For medication-related queries",
        severity: Severity::Medium,
        keywords: &["medication", "drug", "prescription", "dose", "side effect"],
        prompt: "\
You are providing medication information. Focus on education while emphasizing \
the importance of following healthcare provider instructions.

Cover generic and brand names, typical uses, common side effects, and important \
interactions. Never advise starting, stopping, or changing a prescribed \
medication; direct dosing questions to a pharmacist or prescriber. Highlight \
when a reported side effect warrants prompt medical contact.",
    },
    MedicalPrompt {
        id: "emergency_triage",
        name: "Emergency Triage",
        description: "For potential emergency situations",
        severity: Severity::Critical,
        keywords: &[
            "emergency",
            "urgent",
            "severe",
            "chest pain",
            "breathing",
            "stroke",
            "heart",
        ],
        prompt: "\
You are responding to a potential medical emergency. Your first priority is to \
direct the user to call emergency services immediately.

Open every response by instructing the user to call 911 (or their local \
emergency number) if the situation is serious. While help is on the way, give \
calm, simple first-aid guidance appropriate to the described situation. Keep \
instructions short and actionable. Never suggest waiting or self-treatment as \
an alternative to emergency care.",
    },
    MedicalPrompt {
        id: "mental_health",
        name: "Mental Health Support",
        description: "For mental health related discussions",
        severity: Severity::High,
        keywords: &["depression", "anxiety", "mental", "suicide", "stress", "panic"],
        prompt: "\
You are providing mental health support information. Take every mention of \
mental distress seriously.

If the user expresses thoughts of self-harm or suicide, immediately provide \
crisis resources (988 Suicide & Crisis Lifeline in the US) and encourage \
contacting them now. Otherwise: listen supportively, discuss coping strategies \
(breathing exercises, mindfulness, physical activity, sleep hygiene, social \
connection), encourage professional help, and maintain a respectful, \
non-judgmental tone.",
    },
    MedicalPrompt {
        id: "pediatric_consultation",
        name: "Pediatric Health",
        description: "For child health related questions",
        severity: Severity::High,
        keywords: &["child", "baby", "infant", "toddler", "pediatric", "kid"],
        prompt: "\
You are providing pediatric health information. Children require special \
consideration due to their developing systems.

Always ask the child's age and adjust information for developmental stage. \
Highlight emergency signs in children: high fever in infants under 3 months, \
difficulty breathing, dehydration, lethargy or unresponsiveness, severe pain. \
Remind caregivers that children are not small adults, symptoms present \
differently, and deterioration can be fast. Recommend pediatric evaluation for \
any concerning symptom.",
    },
];

/// Look up a prompt by its conversation type id
pub fn prompt_by_id(id: &str) -> Option<&'static MedicalPrompt> {
    MEDICAL_PROMPTS.iter().find(|p| p.id == id)
}

/// Select the prompt for a conversation.
///
/// Escalation keywords in the user message (emergency, mental health,
/// pediatric, checked in that order) override the requested conversation
/// type. An unknown or missing type falls back to the general consultation.
pub fn select_prompt(
    conversation_type: Option<&str>,
    user_message: Option<&str>,
) -> &'static MedicalPrompt {
    if let Some(message) = user_message {
        let lowered = message.to_lowercase();
        for id in ESCALATION_ORDER {
            if let Some(prompt) = prompt_by_id(id) {
                if prompt.keywords.iter().any(|k| lowered.contains(k)) {
                    return prompt;
                }
            }
        }
    }

    conversation_type
        .and_then(prompt_by_id)
        .or_else(|| prompt_by_id(DEFAULT_PROMPT_ID))
        .unwrap_or(&MEDICAL_PROMPTS[0])
}

/// Build the full system prompt text: disclaimer preamble plus the entry body
pub fn system_prompt(prompt: &MedicalPrompt) -> String {
    format!("{MEDICAL_DISCLAIMER}\n\n{}", prompt.prompt)
}
