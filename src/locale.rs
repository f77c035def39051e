//! Static UI strings for every supported interface language.

use crate::provider::{Language, ProviderError};

pub struct UiStrings {
    pub app_title: &'static str,
    pub home_tagline: &'static str,
    pub pick_file: &'static str,
    pub extracting: &'static str,
    pub read_tab: &'static str,
    pub explain_tab: &'static str,
    pub comic_tab: &'static str,
    pub video_tab: &'static str,
    pub play: &'static str,
    pub stop: &'static str,
    pub buffering: &'static str,
    pub speed: &'static str,
    pub volume: &'static str,
    pub language_label: &'static str,
    pub summary_heading: &'static str,
    pub questions_heading: &'static str,
    pub chat_placeholder: &'static str,
    pub send: &'static str,
    pub talk_start: &'static str,
    pub talk_stop: &'static str,
    pub listening: &'static str,
    pub make_comic: &'static str,
    pub drawing_panels: &'static str,
    pub make_video: &'static str,
    pub rendering_video: &'static str,
    pub open_video: &'static str,
    pub cancel: &'static str,
    pub back_home: &'static str,
    pub retry: &'static str,
    pub err_invalid_input: &'static str,
    pub err_unavailable: &'static str,
    pub err_overloaded: &'static str,
    pub err_credentials: &'static str,
    pub err_safety: &'static str,
    pub err_malformed: &'static str,
}

pub fn strings(language: Language) -> &'static UiStrings {
    match language {
        Language::English => &ENGLISH,
        Language::Spanish => &SPANISH,
        Language::French => &FRENCH,
        Language::Vietnamese => &VIETNAMESE,
    }
}

/// Child-friendly wording for provider failures.
pub fn friendly_provider_error(error: &ProviderError, language: Language) -> &'static str {
    let ui = strings(language);
    match error {
        ProviderError::InvalidInput(_) => ui.err_invalid_input,
        ProviderError::Unavailable(_) => ui.err_unavailable,
        ProviderError::Overloaded => ui.err_overloaded,
        ProviderError::InvalidCredentials => ui.err_credentials,
        ProviderError::SafetyRejection => ui.err_safety,
        ProviderError::Malformed(_) => ui.err_malformed,
    }
}

static ENGLISH: UiStrings = UiStrings {
    app_title: "Storylantern",
    home_tagline: "Pick a page from your book and I will read it with you!",
    pick_file: "Choose a photo or PDF",
    extracting: "Reading your page...",
    read_tab: "Read",
    explain_tab: "Explain",
    comic_tab: "Comic",
    video_tab: "Movie",
    play: "Read to me",
    stop: "Stop",
    buffering: "Getting ready...",
    speed: "Speed",
    volume: "Volume",
    language_label: "Language",
    summary_heading: "What the story is about",
    questions_heading: "You could ask...",
    chat_placeholder: "Ask me anything about the story",
    send: "Ask",
    talk_start: "Talk to me",
    talk_stop: "Stop talking",
    listening: "I'm listening...",
    make_comic: "Make a comic",
    drawing_panels: "Drawing your comic...",
    make_video: "Make a movie",
    rendering_video: "Making your movie, this takes a while...",
    open_video: "Watch it",
    cancel: "Never mind",
    back_home: "New page",
    retry: "Try again",
    err_invalid_input: "I couldn't use that file. Can you try another one?",
    err_unavailable: "I can't reach my helpers right now. Try again in a moment.",
    err_overloaded: "My helpers are very busy. Let's try again soon.",
    err_credentials: "A grown-up needs to check the app's key.",
    err_safety: "I can't help with that page. Let's pick another one.",
    err_malformed: "Something got jumbled. Let's try that again.",
};

static SPANISH: UiStrings = UiStrings {
    app_title: "Storylantern",
    home_tagline: "¡Elige una página de tu libro y la leeremos juntos!",
    pick_file: "Elige una foto o PDF",
    extracting: "Leyendo tu página...",
    read_tab: "Leer",
    explain_tab: "Explicar",
    comic_tab: "Cómic",
    video_tab: "Película",
    play: "Léemelo",
    stop: "Parar",
    buffering: "Preparando...",
    speed: "Velocidad",
    volume: "Volumen",
    language_label: "Idioma",
    summary_heading: "De qué trata el cuento",
    questions_heading: "Podrías preguntar...",
    chat_placeholder: "Pregúntame lo que quieras sobre el cuento",
    send: "Preguntar",
    talk_start: "Háblame",
    talk_stop: "Dejar de hablar",
    listening: "Te escucho...",
    make_comic: "Crear un cómic",
    drawing_panels: "Dibujando tu cómic...",
    make_video: "Crear una película",
    rendering_video: "Haciendo tu película, tarda un poco...",
    open_video: "Verla",
    cancel: "Mejor no",
    back_home: "Otra página",
    retry: "Intentar de nuevo",
    err_invalid_input: "No pude usar ese archivo. ¿Pruebas con otro?",
    err_unavailable: "No encuentro a mis ayudantes. Inténtalo en un momento.",
    err_overloaded: "Mis ayudantes están muy ocupados. Probemos pronto.",
    err_credentials: "Un adulto debe revisar la clave de la aplicación.",
    err_safety: "No puedo ayudar con esa página. Elijamos otra.",
    err_malformed: "Algo se enredó. Intentémoslo otra vez.",
};

static FRENCH: UiStrings = UiStrings {
    app_title: "Storylantern",
    home_tagline: "Choisis une page de ton livre et je la lirai avec toi !",
    pick_file: "Choisis une photo ou un PDF",
    extracting: "Je lis ta page...",
    read_tab: "Lire",
    explain_tab: "Expliquer",
    comic_tab: "BD",
    video_tab: "Film",
    play: "Lis-moi l'histoire",
    stop: "Stop",
    buffering: "Je me prépare...",
    speed: "Vitesse",
    volume: "Volume",
    language_label: "Langue",
    summary_heading: "De quoi parle l'histoire",
    questions_heading: "Tu pourrais demander...",
    chat_placeholder: "Pose-moi une question sur l'histoire",
    send: "Demander",
    talk_start: "Parle-moi",
    talk_stop: "Arrêter de parler",
    listening: "Je t'écoute...",
    make_comic: "Créer une BD",
    drawing_panels: "Je dessine ta BD...",
    make_video: "Créer un film",
    rendering_video: "Je fabrique ton film, ça prend un peu de temps...",
    open_video: "Le regarder",
    cancel: "Laisse tomber",
    back_home: "Nouvelle page",
    retry: "Réessayer",
    err_invalid_input: "Je n'ai pas pu utiliser ce fichier. Essaie avec un autre ?",
    err_unavailable: "Je n'arrive pas à joindre mes assistants. Réessaie dans un instant.",
    err_overloaded: "Mes assistants sont très occupés. Réessayons bientôt.",
    err_credentials: "Un adulte doit vérifier la clé de l'application.",
    err_safety: "Je ne peux pas aider avec cette page. Choisissons-en une autre.",
    err_malformed: "Quelque chose s'est emmêlé. Recommençons.",
};

static VIETNAMESE: UiStrings = UiStrings {
    app_title: "Storylantern",
    home_tagline: "Chọn một trang sách và mình sẽ cùng đọc nhé!",
    pick_file: "Chọn ảnh hoặc PDF",
    extracting: "Đang đọc trang của bạn...",
    read_tab: "Đọc",
    explain_tab: "Giải thích",
    comic_tab: "Truyện tranh",
    video_tab: "Phim",
    play: "Đọc cho mình nghe",
    stop: "Dừng lại",
    buffering: "Đang chuẩn bị...",
    speed: "Tốc độ",
    volume: "Âm lượng",
    language_label: "Ngôn ngữ",
    summary_heading: "Câu chuyện kể về điều gì",
    questions_heading: "Bạn có thể hỏi...",
    chat_placeholder: "Hỏi mình bất cứ điều gì về câu chuyện",
    send: "Hỏi",
    talk_start: "Nói chuyện với mình",
    talk_stop: "Ngừng nói",
    listening: "Mình đang nghe...",
    make_comic: "Tạo truyện tranh",
    drawing_panels: "Đang vẽ truyện tranh của bạn...",
    make_video: "Tạo phim",
    rendering_video: "Đang làm phim của bạn, hơi lâu một chút...",
    open_video: "Xem phim",
    cancel: "Thôi vậy",
    back_home: "Trang mới",
    retry: "Thử lại",
    err_invalid_input: "Mình không dùng được tệp đó. Bạn thử tệp khác nhé?",
    err_unavailable: "Mình không liên lạc được với trợ thủ. Thử lại sau một lát nhé.",
    err_overloaded: "Trợ thủ của mình đang rất bận. Mình thử lại sau nhé.",
    err_credentials: "Cần người lớn kiểm tra khóa của ứng dụng.",
    err_safety: "Mình không giúp được với trang này. Chọn trang khác nhé.",
    err_malformed: "Có gì đó bị rối. Mình thử lại nhé.",
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ALL_LANGUAGES;

    #[test]
    fn every_language_has_strings() {
        for &language in ALL_LANGUAGES {
            let ui = strings(language);
            assert!(!ui.play.is_empty());
            assert!(!ui.err_unavailable.is_empty());
        }
    }

    #[test]
    fn provider_errors_map_to_friendly_text() {
        let text = friendly_provider_error(&ProviderError::Overloaded, Language::English);
        assert_eq!(text, strings(Language::English).err_overloaded);
    }
}
