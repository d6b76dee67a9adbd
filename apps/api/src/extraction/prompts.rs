// LLM prompt constants for experience-block extraction.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for one experience block. Appended to the shared
/// JSON-only fragment at call time.
pub const EXPERIENCE_SYSTEM: &str = "Tu es un expert en analyse de CV chargé de structurer \
    des expériences professionnelles sans jamais inventer d'information et en respectant \
    strictement les données fournies.";

/// Experience extraction template.
/// Replace: {grounding_instruction}, {block_text}
pub const EXPERIENCE_PROMPT_TEMPLATE: &str = r#"{grounding_instruction}

Tu reçois un bloc brut issu d'un CV, correspondant à UNE expérience professionnelle.
Extrais UNIQUEMENT les informations présentes dans ce bloc.

Contraintes absolues :
1. Ne reformate pas les dates : reprends exactement le texte des dates (ex: "Septembre 2021 - Aujourd'hui").
2. N'invente jamais d'expérience ni d'information absente du texte.
3. Si un champ manque, laisse-le vide ("") ; les listes manquantes sont vides ([]).
4. "tasks" : les phrases d'action (puces ou phrases) décrivant le travail, sans les résumer.
5. "skills" : uniquement les technologies, outils et méthodes cités EXPLICITEMENT dans le bloc (ex: Java, AWS, Git). Aucune compétence comportementale.
6. "duration" : laisse toujours vide, elle est calculée ailleurs.
7. "full_text" : laisse toujours vide.

Retourne un objet JSON avec EXACTEMENT ces neuf clés, sans clé supplémentaire :
{
  "job_title": "Intitulé exact du poste",
  "company": "Nom de l'entreprise",
  "location": "Ville, pays si présent",
  "dates": "Dates exactes telles qu'écrites",
  "duration": "",
  "summary": "Court résumé si présent, sinon vide",
  "tasks": ["Tâche 1", "Tâche 2"],
  "skills": ["Java", "Python"],
  "full_text": ""
}

Bloc à analyser :
"""
{block_text}
""""#;
