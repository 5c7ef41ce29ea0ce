//! Static first-aid knowledge: guidance text, pathways and reply templates.

use super::conversation_state::PathwayKind;

/// One step of snake-bite first aid, with the question keywords it answers.
pub struct FirstAidStep {
    pub title: &'static str,
    pub topics: &'static [&'static str],
    pub detail: &'static str,
}

pub static FIRST_AID_STEPS: [FirstAidStep; 5] = [
    FirstAidStep {
        title: "Move away from the snake",
        topics: &["snake", "away"],
        detail: "Move the person at least a few steps away from the snake. Do not try to catch or kill it. If it is still attached, use a stick or tool to make it let go.",
    },
    FirstAidStep {
        title: "Remove tight items and keep still",
        topics: &["ring", "bracelet", "tight", "calm"],
        detail: "Take off rings, bracelets, watches and tight clothing near the bite before swelling starts. Keep the person calm and as still as possible.",
    },
    FirstAidStep {
        title: "Immobilize the limb",
        topics: &["limb", "straight", "bite is"],
        detail: "Keep the bitten limb still and straight, supported with a splint or folded cloth if you have one. Do not tie anything around it and never cut or suck the bite.",
    },
    FirstAidStep {
        title: "Prepare transport",
        topics: &["stretcher", "transport", "facility"],
        detail: STRETCHER_METHODS,
    },
    FirstAidStep {
        title: "Recovery position and breathing",
        topics: &["breath", "left side", "dizzy", "vomit"],
        detail: "If the person feels dizzy or vomits, lay them on their left side with the top knee bent. Watch their breathing closely and be ready to help if it stops.",
    },
];

pub const STRETCHER_METHODS: &str = "To build a stretcher: lay two strong poles about an arm's length apart and wrap a blanket around them in three folds, or push the poles through the sleeves of two or three buttoned-up jackets. Lift together on a count so the bitten limb stays still, and get to a health facility immediately.";

/// Paraphrases of the opening guidance. Every variant covers the steps of
/// `FIRST_AID_STEPS` in the same order.
pub static INITIAL_GUIDANCE: [&str; 5] = [
    "Move them away from the snake.\nRemove tight items like rings and bracelets. Keep them calm and still.\nKeep the bitten limb still and straight. Don't tie anything around it or try to cut or suck the bite.\nIf transport is far, make a stretcher from available materials and get to a health facility immediately. The emergency number is 999.\nIf they feel dizzy or vomit, lay them on their left side. Watch their breathing and be ready to help.",
    "First, get the person a safe distance from the snake.\nTake off rings, bracelets and anything tight near the bite, then help them stay calm and still.\nKeep the limb straight and supported. No tourniquets, no cutting, no sucking the wound.\nArrange transport now. If help is far away, build a stretcher from poles and a blanket and head to a health facility. Call 999 if you can.\nIf they become dizzy or sick, roll them onto their left side and keep watching their breathing.",
    "Step back from the snake and bring the person with you.\nRemove any jewellery or tight clothing around the bite. Ask them to stay as still as possible.\nDo not tie, cut or suck the bite. Keep the bitten limb still and level.\nGet them to a health facility straight away. A stretcher made of jackets and poles works if there is no vehicle. Emergency number: 999.\nIf vomiting or dizziness starts, place them on their left side and check that they keep breathing.",
    "Get clear of the snake first.\nLoosen or remove rings, bracelets and watches. Keep the person calm and still to slow the venom.\nHold the bitten limb still and straight. Never apply a tight band or cut the wound.\nPlan the trip to the nearest health facility now, and make a stretcher if they have to be carried. Dial 999 for help.\nIf they feel faint or throw up, lay them on their left side and keep an eye on their breathing.",
    "Make sure the person is away from the snake.\nRemove anything tight near the bite and keep them resting quietly.\nKeep the limb still and straight, with nothing tied around it and no cutting or sucking.\nIf the health facility is far, carry them on a stretcher made from available materials. The emergency number here is 999.\nShould they become dizzy or vomit, put them on their left side and watch their breathing carefully.",
];

/// Opening questions used before any pathway question has been asked, and as
/// the fallback pool when generation fails.
pub static UNIVERSAL_QUESTIONS: [&str; 6] = [
    "Is the person calm and still?",
    "Where on the body was the person bitten?",
    "How long ago did the bite happen?",
    "Is the person able to talk to you clearly?",
    "Is anyone else with you who can help?",
    "Have you been able to call the emergency number 999?",
];

/// A named, ordered checklist for one stage of care.
pub struct Pathway {
    pub kind: PathwayKind,
    pub name: &'static str,
    pub questions: &'static [&'static str],
    pub next: PathwayKind,
}

pub static PATHWAYS: [Pathway; 4] = [
    Pathway {
        kind: PathwayKind::InitialAssessment,
        name: "initial assessment",
        questions: &[
            "Has the person moved away from the snake?",
            "Is the person awake and able to answer you?",
            "Can you see where the bite is on the body?",
        ],
        next: PathwayKind::ImmediateCare,
    },
    Pathway {
        kind: PathwayKind::ImmediateCare,
        name: "immediate care",
        questions: &[
            "Have you taken off any rings, bracelets or tight clothing near the bite?",
            "Is the bitten limb being kept still and straight?",
            "Is the person calm and still?",
        ],
        next: PathwayKind::TransportPrep,
    },
    Pathway {
        kind: PathwayKind::TransportPrep,
        name: "transport preparation",
        questions: &[
            "Is transport to a health facility on the way?",
            "Do you have poles and a blanket or jackets to make a stretcher?",
            "How far is the nearest health facility?",
        ],
        next: PathwayKind::Monitoring,
    },
    Pathway {
        kind: PathwayKind::Monitoring,
        name: "monitoring",
        questions: &[
            "Is the person breathing normally?",
            "If they feel dizzy or vomit, have you laid them on their left side?",
            "Has the swelling or pain changed since the bite?",
        ],
        next: PathwayKind::InitialAssessment,
    },
];

pub fn pathway(kind: PathwayKind) -> &'static Pathway {
    match kind {
        PathwayKind::InitialAssessment => &PATHWAYS[0],
        PathwayKind::ImmediateCare => &PATHWAYS[1],
        PathwayKind::TransportPrep => &PATHWAYS[2],
        PathwayKind::Monitoring => &PATHWAYS[3],
    }
}

pub static POSITIVE_ACKNOWLEDGMENTS: [&str; 5] = [
    "Good, that's the right thing to do.",
    "Well done, keep it up.",
    "Great, that helps a lot.",
    "Thank you, you're doing well.",
    "Good work. Stay with them.",
];

pub static NEGATIVE_ACKNOWLEDGMENTS: [&str; 5] = [
    "That's okay. Do it as soon as you safely can.",
    "No problem. Try to do it now if it is safe.",
    "Understood. Please try when you can.",
    "Alright. It is important, so do it when possible.",
    "Okay. If you can't, focus on keeping them still and getting help.",
];

pub static HELP_ACKNOWLEDGMENTS: [&str; 5] = [
    "Let me explain.",
    "Here is what to do.",
    "No worries, here is some more detail.",
    "Of course, let me help.",
    "Here's how.",
];

pub static NEUTRAL_ACKNOWLEDGMENTS: [&str; 5] = [
    "Thanks for letting me know.",
    "Okay, noted.",
    "Got it.",
    "Thank you for the update.",
    "Understood.",
];

pub const SAFE_DEFAULT_REPLY: &str =
    "Keep monitoring the person's condition. Seek medical help as soon as possible.";

/// Detailed instructions for the step a question is about, if any.
pub fn help_for(question: &str) -> Option<&'static str> {
    let question = question.to_lowercase();
    FIRST_AID_STEPS
        .iter()
        .find(|step| step.topics.iter().any(|topic| question.contains(topic)))
        .map(|step| step.detail)
}

/// The first-aid steps as one block of text for generation prompts.
pub fn reference_text() -> String {
    let mut text = String::new();
    for (number, step) in FIRST_AID_STEPS.iter().enumerate() {
        text.push_str(&format!("{}. {}: {}\n", number + 1, step.title, step.detail));
    }
    text
}
