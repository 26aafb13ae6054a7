//! A small built-in corpus of realistic Dutch letters, so a fresh install
//! has something to retrieve from (`briefhulp seed <dir>`).

use std::path::Path;

use briefhulp_core::Result;
use tracing::info;

use crate::ingest::SUMMARY_SUFFIX;

/// One sample letter with its A2 summary.
pub struct SampleLetter {
    pub filename: &'static str,
    pub text: &'static str,
    pub summary: &'static str,
}

pub const SAMPLE_LETTERS: &[SampleLetter] = &[
    SampleLetter {
        filename: "gerechtsdeurwaarder_aankondiging_beslaglegging_1.txt",
        text: "Gerechtsdeurwaarderskantoor Bakker & Visser\n\
Postbus 2210, 3000 CE Rotterdam\n\
BETREFT: AANKONDIGING BESLAG OP UW INKOMEN\n\
Kenmerk: GDW-2024-0815\n\n\
TEN VERZOEKE VAN: Zorgverzekeraar Zilveren Kruis, gevestigd te Zeist.\n\
U bent bij vonnis van de kantonrechter veroordeeld tot betaling van € 612,40. \
Ondanks herhaalde verzoeken is dit bedrag niet betaald. Met rente en kosten bedraagt de vordering nu € 834,95.\n\n\
Als u niet binnen 8 dagen na dagtekening van deze brief betaalt, leggen wij beslag op uw loon. \
Uw werkgever moet dan een deel van uw loon aan ons overmaken. U houdt minimaal de beslagvrije voet over.\n\n\
Kunt u niet in één keer betalen? Neem dan contact met ons op voor een betalingsregeling.\n\
Met vriendelijke groet, [Naam Deurwaarder], gerechtsdeurwaarder",
        summary: "U heeft een schuld van € 834,95 bij de zorgverzekeraar. \
Betaal binnen 8 dagen. Anders haalt de deurwaarder geld van uw loon af. \
Kunt u niet alles betalen? Bel de deurwaarder voor een regeling.",
    },
    SampleLetter {
        filename: "belastingdienst_voorlopige_aanslag_2024_2.txt",
        text: "Belastingdienst\n\
Betreft: Voorlopige aanslag inkomstenbelasting 2024\n\
Aanslagnummer: 1234.56.789.H.46\n\n\
Geachte heer Yilmaz,\n\n\
Wij hebben een voorlopige aanslag voor 2024 voor u berekend. Dit is een schatting van de belasting die u moet betalen. \
U betaalt in 11 maandelijkse termijnen van € 42,00. De eerste termijn moet uiterlijk 28 februari 2024 op onze rekening staan.\n\n\
Klopt de schatting niet? Pas uw voorlopige aanslag dan aan via Mijn Belastingdienst. \
Na afloop van het jaar doet u aangifte en ontvangt u een definitieve aanslag.\n\n\
Met vriendelijke groet, Belastingdienst",
        summary: "De Belastingdienst denkt dat u belasting moet betalen over 2024. \
U betaalt elke maand € 42. De eerste keer voor 28 februari. \
Klopt het bedrag niet? Dan kunt u het veranderen op de website.",
    },
    SampleLetter {
        filename: "cjib_verkeersboete_aanmaning_3.txt",
        text: "Centraal Justitieel Incassobureau (CJIB)\n\
Betreft: Eerste aanmaning verkeersboete\n\
Beschikkingsnummer: 9876 5432 1098 7654\n\n\
Geachte mevrouw De Graaf,\n\n\
U heeft de boete van € 109,00 voor te hard rijden niet op tijd betaald. Daarom is het bedrag verhoogd met € 54,50. \
U moet nu € 163,50 betalen, uiterlijk binnen 8 weken na de datum van deze brief.\n\n\
Betaalt u niet op tijd, dan wordt het bedrag opnieuw verhoogd. \
Bent u het niet eens met de boete? U kon binnen 6 weken na de eerste beschikking beroep instellen bij de officier van justitie.\n\n\
Met vriendelijke groet, CJIB",
        summary: "U heeft een verkeersboete niet op tijd betaald. \
Nu moet u € 163,50 betalen. Doe dit binnen 8 weken. \
Als u te laat bent, wordt de boete nog hoger.",
    },
    SampleLetter {
        filename: "uwv_oproep_verzekeringsarts_4.txt",
        text: "UWV\n\
Betreft: Uitnodiging gesprek verzekeringsarts\n\
Ons kenmerk: WIA-2024-33018\n\n\
Geachte heer El Amrani,\n\n\
U heeft een WIA-uitkering aangevraagd. Om te beoordelen hoeveel u nog kunt werken, nodigen wij u uit voor een gesprek met de verzekeringsarts. \
Het gesprek is op dinsdag 12 maart 2024 om 10:30 uur op ons kantoor in Utrecht.\n\n\
Neem een geldig identiteitsbewijs mee, en ook medische informatie die belangrijk is. \
Kunt u niet komen? Bel ons dan zo snel mogelijk. Als u zonder goede reden niet komt, kan dit gevolgen hebben voor uw uitkering.\n\n\
Met vriendelijke groet, UWV",
        summary: "U moet praten met een arts van het UWV. \
Dat is op 12 maart om half elf in Utrecht. Neem uw ID-kaart mee. \
Kunt u niet? Bel het UWV snel.",
    },
    SampleLetter {
        filename: "gemeente_beslissing_bijzondere_bijstand_5.txt",
        text: "Gemeente Eindhoven, afdeling Werk en Inkomen\n\
Betreft: Beslissing op uw aanvraag bijzondere bijstand\n\
Zaaknummer: BB-24-00917\n\n\
Geachte mevrouw Pietersen,\n\n\
U heeft bijzondere bijstand aangevraagd voor een nieuwe wasmachine. Wij hebben uw aanvraag beoordeeld en wijzen deze af. \
Uw inkomen is hoger dan de grens voor bijzondere bijstand.\n\n\
Bent u het niet eens met dit besluit? Dan kunt u binnen 6 weken bezwaar maken. \
Stuur een brief met uw naam, het zaaknummer en waarom u het er niet mee eens bent.\n\n\
Met vriendelijke groet, het college van burgemeester en wethouders",
        summary: "De gemeente geeft u geen geld voor een wasmachine. \
Uw inkomen is te hoog. \
Bent u het er niet mee eens? Schrijf dan binnen 6 weken een bezwaarbrief.",
    },
    SampleLetter {
        filename: "woningcorporatie_huurachterstand_6.txt",
        text: "Woonstichting De Linie\n\
Betreft: Huurachterstand\n\
Huurcontractnummer: 4455-12\n\n\
Geachte heer Jansen,\n\n\
Uit onze administratie blijkt dat u de huur van januari en februari nog niet heeft betaald. \
De achterstand is € 1.386,00. Wij vragen u dit bedrag binnen 14 dagen te betalen.\n\n\
Lukt dat niet, neem dan contact met ons op. Wij kunnen samen een betalingsregeling maken. \
Als u niet reageert, geven wij de zaak uit handen aan een deurwaarder. Dat brengt extra kosten met zich mee en kan uiteindelijk leiden tot ontruiming.\n\n\
Met vriendelijke groet, afdeling Incasso",
        summary: "U heeft twee maanden geen huur betaald. U moet € 1.386 betalen binnen 14 dagen. \
Lukt dat niet? Bel de woningcorporatie voor een regeling. \
Doet u niets, dan komt er een deurwaarder.",
    },
    SampleLetter {
        filename: "ziekenhuis_afspraakbevestiging_7.txt",
        text: "Ziekenhuis Rijnstate, polikliniek Cardiologie\n\
Betreft: Bevestiging afspraak\n\
Patiëntnummer: 7001234\n\n\
Geachte mevrouw Öztürk,\n\n\
Hierbij bevestigen wij uw afspraak bij de cardioloog op vrijdag 22 maart 2024 om 14:15 uur. \
Meld u 15 minuten van tevoren bij de balie op de begane grond. Neem uw medicijnpaspoort en verzekeringspas mee.\n\n\
Kunt u niet komen? Zeg de afspraak dan minimaal 24 uur van tevoren af. \
Als u niet afzegt, kunnen wij kosten in rekening brengen.\n\n\
Met vriendelijke groet, secretariaat Cardiologie",
        summary: "U heeft een afspraak bij de hartdokter op 22 maart om kwart over twee. \
Kom een kwartier eerder. Neem uw medicijnlijst en verzekeringspas mee. \
Kunt u niet? Zeg het een dag van tevoren af.",
    },
    SampleLetter {
        filename: "energieleverancier_wijziging_voorschot_8.txt",
        text: "Energieleverancier Vattenfall\n\
Betreft: Wijziging van uw voorschotbedrag\n\
Klantnummer: 300118822\n\n\
Geachte heer Bos,\n\n\
Uw verbruik van gas en stroom is hoger dan wij hadden verwacht. Daarom verhogen wij uw maandelijkse voorschot \
van € 135,00 naar € 168,00, met ingang van 1 april 2024.\n\n\
U kunt uw voorschot zelf aanpassen in de app of op onze website. Wilt u uw contract opzeggen? \
Dat kan met een opzegtermijn van 30 dagen. Let op: bij een vast contract kan een opzegvergoeding gelden.\n\n\
Met vriendelijke groet, Klantenservice",
        summary: "U gebruikt meer gas en stroom dan gedacht. \
Vanaf 1 april betaalt u € 168 per maand in plaats van € 135. \
U kunt dit bedrag zelf veranderen in de app.",
    },
    SampleLetter {
        filename: "duo_terugbetaling_studieschuld_9.txt",
        text: "Dienst Uitvoering Onderwijs (DUO)\n\
Betreft: Start terugbetaling studieschuld\n\
Relatienummer: 1122334455\n\n\
Geachte mevrouw Kramer,\n\n\
Uw aanloopfase is voorbij. Vanaf 1 januari 2025 gaat u uw studieschuld terugbetalen. \
Uw maandbedrag is € 58,20. Dit bedrag wordt automatisch van uw rekening afgeschreven.\n\n\
Is uw inkomen laag? Dan kunt u een lager maandbedrag aanvragen via Mijn DUO. \
Geef dit op tijd door, anders betaalt u het volledige bedrag.\n\n\
Met vriendelijke groet, DUO",
        summary: "U moet uw studieschuld gaan terugbetalen. \
Vanaf januari 2025 betaalt u elke maand € 58,20. \
Heeft u weinig geld? Vraag dan een lager bedrag aan bij DUO.",
    },
    SampleLetter {
        filename: "svb_kinderbijslag_wijziging_10.txt",
        text: "Sociale Verzekeringsbank (SVB)\n\
Betreft: Uw kinderbijslag\n\
Klantnummer: 5566778899\n\n\
Geachte heer Mahabier,\n\n\
Uw zoon wordt binnenkort 12 jaar. Vanaf het volgende kwartaal ontvangt u daarom een hoger bedrag aan kinderbijslag. \
U hoeft hiervoor niets te doen.\n\n\
Verandert er iets in uw situatie, bijvoorbeeld als uw kind niet meer bij u woont? Geef dit dan binnen 4 weken aan ons door. \
Anders moet u misschien kinderbijslag terugbetalen.\n\n\
Met vriendelijke groet, SVB",
        summary: "Uw zoon wordt 12. U krijgt daarom meer kinderbijslag. \
U hoeft niets te doen. \
Verandert er iets thuis? Vertel het binnen 4 weken aan de SVB.",
    },
];

/// Write the sample letters and their `.summary.txt` sidecars into `dir`.
/// Existing files are left alone. Returns the number of letters written.
pub fn write_samples(dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(dir)?;
    let mut written = 0;

    for sample in SAMPLE_LETTERS {
        let letter = dir.join(sample.filename);
        if letter.exists() {
            continue;
        }
        std::fs::write(&letter, sample.text)?;

        let stem = sample.filename.trim_end_matches(".txt");
        std::fs::write(dir.join(format!("{}{}", stem, SUMMARY_SUFFIX)), sample.summary)?;
        written += 1;
    }

    info!("Wrote {} sample letters to {}", written, dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LetterOrigin;

    #[test]
    fn test_sample_names_parse() {
        for sample in SAMPLE_LETTERS {
            let origin = LetterOrigin::from_filename(sample.filename).unwrap();
            assert!(origin.is_known_source(), "{}", sample.filename);
            assert!(origin.subject.is_some());
            // A2 summaries are short
            assert!(sample.summary.split(". ").count() <= 4);
        }
    }

    #[test]
    fn test_write_samples_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(write_samples(dir.path()).unwrap(), SAMPLE_LETTERS.len());
        assert_eq!(write_samples(dir.path()).unwrap(), 0);

        let sidecar = dir
            .path()
            .join("cjib_verkeersboete_aanmaning_3.summary.txt");
        assert!(sidecar.exists());
    }
}
