//! Prompt templates. Every prompt is Dutch; the explanations target CEFR
//! level A2 and drafted letters level B1.

use chrono::NaiveDate;

use crate::analysis::SuggestedAction;
use crate::letter::{DraftRequest, Tone};
use crate::types::ChatMessage;

pub const ACTION_MARKER: &str = "###ACTIE###";
pub const DATA_MARKER: &str = "###DATA###";

/// Sentence every explanation ends with.
pub const CLOSING_QUESTION: &str =
    "Is dit zo duidelijk, of is er een woord dat ik extra moet uitleggen?";

/// An example letter passed to the explain prompt as reference.
#[derive(Debug, Clone)]
pub struct ReferenceExample {
    /// E.g. "Belastingdienst – voorlopige aanslag 2024".
    pub title: String,
    pub summary: String,
}

/// Explain a letter at A2 level, ending with the action and data markers.
pub fn explain_prompt(letter: &str, examples: &[ReferenceExample]) -> String {
    let actions = SuggestedAction::KNOWN
        .iter()
        .map(|a| format!("`{}`", a.label()))
        .collect::<Vec<_>>()
        .join(", ");

    let reference = if examples.is_empty() {
        String::new()
    } else {
        let list = examples
            .iter()
            .map(|e| format!("- {}: {}", e.title, e.summary))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "\n**VOORBEELDEN VAN VERGELIJKBARE BRIEVEN (alleen om de stijl en het soort brief te herkennen, \
neem hier GEEN gegevens uit over):**\n{}\n",
            list
        )
    };

    format!(
        r#"Je bent een geduldige en zeer precieze assistent voor mensen die moeite hebben met lezen. Leg de officiële brief hieronder uit in eenvoudig en foutloos Nederlands (A2-niveau).

**REGELS:**
1. Gebruik **alleen** wat in de brief staat. Verzin niets.
2. Houd je precies aan de opbouw hieronder.

**OPBOUW VAN JE ANTWOORD:**
Begin met één zin die past bij het soort nieuws (goed, slecht, ernstig of neutraal).
Zet daarna de details in een lijst. Elk punt begint op een nieuwe regel met `* ` en het juiste icoon:
    * 🏢 **Van wie:** de volledige naam van de afzender.
    * 🎯 **Wat moet u doen?:** de actie, duidelijk omschreven.
    * 💰 **Bedrag:** alle bedragen, met uitleg waarvoor.
    * 🗓️ **Datum:** alle data, met uitleg wat er dan moet gebeuren.
    * ℹ️ **Let op:** andere belangrijke dingen.
Sluit altijd af met: "{closing}"

**VERVOLGACTIE (intern):**
Zet na je antwoord een nieuwe regel die begint met `{action_marker}` en daarna de meest logische vervolgactie. Kies uit: {actions}.
Voorbeeld: {action_marker} Uitstel vragen

**GEGEVENS (intern):**
Zet daarna een regel die begint met `{data_marker}` in dit formaat: `Afzender: [naam] | Kenmerk: [nummer]`. Gebruik "N.v.t." als iets niet in de brief staat.
Voorbeeld: {data_marker} Afzender: Intrum Justitia B.V. | Kenmerk: 10987654
{reference}
**DE BRIEF:**
{letter}

**UITLEG:**"#,
        closing = CLOSING_QUESTION,
        action_marker = ACTION_MARKER,
        data_marker = DATA_MARKER,
        actions = actions,
        reference = reference,
        letter = letter.trim(),
    )
}

/// "What happens if I do nothing, and what is the best thing to do now?"
pub fn consequences_prompt(letter: &str) -> String {
    format!(
        r#"Je bent een rustige en eerlijke adviseur voor mensen die moeite hebben met lezen. Leg uit wat de gevolgen van de brief hieronder zijn.

**REGELS:**
1. Gebruik **alleen** wat in de brief staat.
2. Gebruik heel eenvoudige taal (A2-niveau) en korte zinnen.
3. Maak mensen niet onnodig bang, maar wees eerlijk over de risico's.

**DE VOLLEDIGE BRIEF:**
{letter}

**JOUW ANTWOORD:**
Schrijf één korte alinea die deze twee vragen beantwoordt:
* **Wat gebeurt er als ik niets doe?** (de logische volgende stap, bijvoorbeeld "dan kan er een deurwaarder komen")
* **Wat is het beste wat ik nu kan doen?** (de meest nuttige actie, bijvoorbeeld "neem direct contact op met [organisatie]")

Bijvoorbeeld: "Als u niets doet, worden de kosten waarschijnlijk hoger en kan er een deurwaarder komen. Het beste is om nu Intrum te bellen en te vragen of u in delen mag betalen.""#,
        letter = letter.trim(),
    )
}

/// Answer a follow-up question using only the original letter.
pub fn chat_prompt(letter: &str, summary: &str, history: &[ChatMessage], question: &str) -> String {
    let history = history
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Je bent een behulpzame assistent. De gebruiker heeft een moeilijke brief laten uitleggen en stelt nu vervolgvragen.

**REGELS:**
1. Baseer je antwoord **alleen** op de originele tekst van de brief.
2. Houd het simpel (A2-niveau): korte zinnen en makkelijke woorden.
3. Geef direct antwoord op de vraag.

Originele tekst van de brief:
---
{letter}
---
Jouw eerdere uitleg (alleen als context):
---
{summary}
---
Het gesprek tot nu toe:
{history}

Beantwoord nu de nieuwe vraag.
Gebruiker: {question}
Assistent:"#,
        letter = letter.trim(),
        summary = summary.trim(),
        history = history,
        question = question.trim(),
    )
}

/// Write a formal B1-level reply letter from the draft form.
pub fn draft_prompt(request: &DraftRequest, date: NaiveDate) -> String {
    let tone = match request.tone {
        Tone::Angry => "zeer dringend en ontevreden (blijf beleefd)",
        other => other.label(),
    };
    let extra = if request.extra_info.is_empty() {
        "Geen extra informatie gegeven."
    } else {
        request.extra_info.as_str()
    };

    format!(
        r#"Je bent expert in het schrijven van formele Nederlandse brieven. Schrijf een goed opgebouwde, foutloze voorbeeldbrief op B1-taalniveau.

**REGELS:**
1. Volg de opbouw hieronder **precies**.
2. Laat placeholders zoals `[Jouw Naam]` staan waar de gebruiker zelf iets moet invullen.
3. Schrijf de kern van de brief op basis van het doel, de toon en de extra informatie.
4. Blijf altijd beleefd en professioneel, ook als de toon boos is.

**GEGEVENS:**
- **Doel:** {kind}
- **Aan:** {recipient}
- **Kenmerk:** {reference}
- **Toon:** {tone}
- **Extra informatie van de gebruiker:** {extra}

**OPBOUW (GEBRUIK DEZE PRECIES):**

[Jouw Naam]
[Jouw Straat en Huisnummer]
[Jouw Postcode en Woonplaats]
[Jouw E-mailadres]
[Jouw Telefoonnummer]

{recipient}
[Adres van Ontvanger]
[Postcode en Plaats van Ontvanger]

[Jouw Woonplaats], {date}

**Betreft:** {reference}

Geachte heer/mevrouw,

Ik schrijf u naar aanleiding van [KORTE AANLEIDING, bijvoorbeeld 'uw brief met kenmerk {reference}'].

[KERN VAN DE BRIEF: verwerk de extra informatie in korte, duidelijke alinea's in de gevraagde toon.]

[AFSLUITING: wat verwacht u als volgende stap? Bijvoorbeeld 'Ik zie uw reactie graag binnen 14 dagen tegemoet.']

Met vriendelijke groet,

[Jouw Naam]
"#,
        kind = request.kind.label(),
        recipient = request.recipient,
        reference = request.reference_or_default(),
        tone = tone,
        extra = extra,
        date = date.format("%d-%m-%Y"),
    )
}

/// Render an explanation in another language, keeping it very simple.
pub fn translate_prompt(text: &str, language: &str) -> String {
    format!(
        r#"Vertaal de uitleg hieronder naar het {language}. Gebruik heel eenvoudige woorden en korte zinnen, voor iemand die moeite heeft met lezen. Houd de lijst en de iconen (🏢 🎯 💰 🗓️ ℹ️) zoals ze zijn. Bedragen, data, namen en nummers blijven precies gelijk. Geef alleen de vertaling.

UITLEG:
{text}

VERTALING:"#,
        language = language.trim(),
        text = text.trim(),
    )
}

/// Two to four very simple A2 sentences about an example letter.
pub fn example_summary_prompt(letter: &str) -> String {
    format!(
        r#"Je schrijft teksten op A2-taalniveau voor mensen die moeite hebben met lezen.
Vat de officiële brief hieronder samen in 2 tot 4 heel eenvoudige, korte zinnen.
Noem alleen de belangrijkste boodschap of actie. Gebruik geen moeilijke woorden.

BRIEF:
"{letter}"

A2-SAMENVATTING:"#,
        letter = letter.trim(),
    )
}
