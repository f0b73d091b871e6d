//! What the robot says during a game (Brazilian Portuguese)

pub const GREETING: &str = "Olá! Estou pronto para o jogo de soletrar.";

pub const SPELL_PROMPT: &str =
    "Pode começar a soletrar. Diga 'confirmar' quando terminar ou 'apagar' para a última letra.";

pub const CANNOT_HEAR: &str = "Não consigo ouvir você agora.";

pub const SORRY_ERROR: &str = "Desculpe, ocorreu um erro.";

pub const TIME_IS_UP: &str = "O tempo acabou. Vamos tentar de novo.";

pub const CORRECT: &str = "Parabéns, você acertou!";

pub fn new_word(word: &str) -> String {
    format!("A nova palavra é: {}", word)
}

pub fn wrong(word: &str) -> String {
    format!("Que pena, você errou. A palavra correta era {}", word)
}
